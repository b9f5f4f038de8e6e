//! Analog Input Partition and Timing
//!
//! The board exposes 37 analog physical inputs sharing one ADC. Ids are
//! fixed by the host protocol and partitioned as:
//!
//! ```text
//!  0 ..= 31   external inputs behind the 32:1 mux
//!  32         offset calibration input
//!  33 ..= 35  supply rails (9 V, 5 V, 3.3 V)
//!  36         cold junction
//! ```

// ===== INPUT PARTITION =====

/// Total number of analog physical inputs.
pub const NUM_ANALOG_INPUTS: usize = 37;

/// Number of external inputs behind the analog multiplexer.
pub const NUM_EXT_ANALOG_INPUTS: usize = 32;

/// Number of calibration inputs.
pub const NUM_CAL_ANALOG_INPUTS: usize = 1;

/// Number of internal inputs (supply rails plus cold junction).
pub const NUM_INT_ANALOG_INPUTS: usize = 4;

/// Physical id of the offset calibration input.
pub const OFFSET_CALIBRATION_INPUT: u8 = 32;

/// Physical id of the 9 V supply monitor.
pub const SUPPLY_9V_INPUT: u8 = 33;

/// Physical id of the 5 V supply monitor.
pub const SUPPLY_5V_INPUT: u8 = 34;

/// Physical id of the 3.3 V supply monitor.
pub const SUPPLY_3V3_INPUT: u8 = 35;

/// Physical id of the cold junction sensor.
pub const COLD_JUNCTION_INPUT: u8 = 36;

const _: () = assert!(
    NUM_EXT_ANALOG_INPUTS + NUM_CAL_ANALOG_INPUTS + NUM_INT_ANALOG_INPUTS == NUM_ANALOG_INPUTS,
    "analog partition must cover every input exactly once"
);

// ===== CHANNEL RECORDS =====

/// Maximum analog input name length in bytes.
pub const MAX_ANALOG_INPUT_NAME_LENGTH: usize = 24;

/// Per-channel sample ring capacity.
///
/// 50 samples × 16 bytes = 800 bytes per channel, ~30 KB across all inputs.
pub const ANALOG_INPUT_BUFFER_SIZE: usize = 50;

/// Records written per export batch before yielding.
pub const SINGLE_ANALOG_WRITE_COUNT: usize = 10;

/// Name given to an input added without a NAME key.
pub const DEFAULT_INPUT_NAME: &str = "NONE";

/// Name of the always-present cold junction channel.
pub const COLD_JUNCTION_NAME: &str = "COLD JUNCTION";

/// Name of the calibration channel.
pub const CALIBRATION_INPUT_NAME: &str = "OFFSET CALIBRATION";

// ===== MULTIPLEXER =====

/// Settling delay after switching the external multiplexer.
///
/// The input filter network needs ~2 s to settle after a mux switch before
/// a conversion reflects the new input.
pub const EXTERNAL_MUX_DELAY_MS: u64 = 2000;

/// Bit position of the lowest external mux address line on its port.
pub const EXT_MUX_ADDRESS_SHIFT: u8 = 11;

/// Number of external mux address lines.
pub const EXT_MUX_ADDRESS_LINES: u8 = 5;

/// Port bits written for each external input, indexed by physical id.
///
/// The mux board routes inputs in a non-linear order, so each id maps to a
/// fixed address pattern on pins 11..=15.
pub const EXTERNAL_MUX_SELECTORS: [u16; NUM_EXT_ANALOG_INPUTS] = [
    0x1800, 0x1000, 0x3000, 0x3800, 0x7800, 0x5000, 0x6000, 0x5800,
    0x9800, 0x9000, 0xB000, 0xB800, 0xF800, 0xD000, 0xE000, 0xD800,
    0x0000, 0x0800, 0x2800, 0x2000, 0x4000, 0x4800, 0x6800, 0x7000,
    0x8000, 0x8800, 0xA800, 0xA000, 0xC000, 0xC800, 0xE800, 0xF000,
];

// ===== SAMPLING =====

/// Analog conversions between interleaved cold junction reads.
pub const COLD_JUNCTION_READ_INTERVAL: u32 = 333;
