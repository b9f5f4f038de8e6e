//! Board constants
//!
//! Fixed sizes, timing and wire tokens for the acquisition board, grouped by
//! the subsystem that owns them. Values that a deployment may want to tune
//! at runtime also appear as defaults in [`crate::config::BoardConfig`].
//!
//! ## Organization
//!
//! - **Analog**: physical input partition, buffer sizes, mux timing
//! - **Digital**: digital input count and buffering
//! - **Command**: line buffer limits and protocol tokens
//! - **Calibration**: temperature window, ADC reference and storage layout
//! - **Governor**: throughput governor tuning

/// Analog input partition, buffers and multiplexer timing.
pub mod analog;

/// Digital input counts and buffering.
pub mod digital;

/// Command line limits and protocol tokens.
pub mod command;

/// Calibration window, ADC reference values and persisted layout.
pub mod calibration;

/// Throughput governor defaults.
pub mod governor;

pub use analog::{
    ANALOG_INPUT_BUFFER_SIZE, COLD_JUNCTION_INPUT, EXTERNAL_MUX_DELAY_MS,
    MAX_ANALOG_INPUT_NAME_LENGTH, NUM_ANALOG_INPUTS, NUM_EXT_ANALOG_INPUTS,
    OFFSET_CALIBRATION_INPUT, SINGLE_ANALOG_WRITE_COUNT,
};

pub use digital::{DIGITAL_INPUT_BUFFER_SIZE, NUM_DIGITAL_INPUTS};

pub use command::{MAX_COMMANDLINE_LENGTH, MAX_COMMANDPART_LENGTH, MAX_NUM_ARGUMENTS};

pub use calibration::{CALIBRATION_VALID_MAX_TEMP, CALIBRATION_VALID_MIN_TEMP, NUM_CAL_TEMPS};
