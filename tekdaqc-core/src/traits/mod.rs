//! Collaborator interfaces
//!
//! The board core never touches hardware directly. Everything outside the
//! core (the ADC chip, GPIO ports, the clock, non-volatile storage and the
//! network transport) is reached through the traits in this module, so the
//! same core runs on the board and against mocks in tests.
//!
//! ## Module Organization
//!
//! - [`time`] - monotonic clock
//! - [`adc`] - ADC driver: input pair selection, conversions, calibration
//! - [`gpio`] - pin groups for the external mux and digital inputs
//! - [`storage`] - 16-bit word store for persisted state
//! - [`sink`] - output and error sinks toward the connected client
//!
//! All traits use static dispatch; the board is generic over its
//! collaborators.

pub mod adc;
pub mod gpio;
pub mod sink;
pub mod storage;
pub mod time;

pub use adc::{AdcDriver, AdcPin};
pub use gpio::{Gpio, PinGroup};
pub use sink::{BufferSink, ErrorSink, OutputSink};
pub use storage::{MemoryStore, NvStore};
pub use time::TimeSource;
