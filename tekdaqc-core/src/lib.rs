//! Core of the Tekdaqc data acquisition board
//!
//! Multiplexes one ADC across 32 external and 5 internal analog inputs,
//! scans 24 digital inputs, and is driven by a line-oriented ASCII command
//! protocol. Sampled data is buffered per channel and exported in framed
//! batches; a governor stretches the sampling cadence while the consumer
//! falls behind.
//!
//! Hardware and transport stay outside: the board reaches them through the
//! traits in [`traits`].
//!
//! ```no_run
//! use tekdaqc_core::{Board, BoardConfig};
//! # use tekdaqc_core::traits::*;
//! # use tekdaqc_core::settings::{BufferSetting, Gain, Level, Rate};
//! # struct Adc;
//! # impl AdcDriver for Adc {
//! #     type Error = ();
//! #     fn select_input_pair(&mut self, _: AdcPin, _: AdcPin) -> Result<(), ()> { unimplemented!() }
//! #     fn configure(&mut self, _: Rate, _: Gain, _: BufferSetting) -> Result<(), ()> { unimplemented!() }
//! #     fn sync(&mut self) -> Result<(), ()> { unimplemented!() }
//! #     fn read_code(&mut self) -> nb::Result<i32, ()> { unimplemented!() }
//! #     fn self_calibrate(&mut self) -> Result<(), ()> { unimplemented!() }
//! #     fn system_gain_calibrate(&mut self) -> Result<(), ()> { unimplemented!() }
//! #     fn gain_calibration_register(&mut self) -> Result<u32, ()> { unimplemented!() }
//! # }
//! # struct Pins;
//! # impl Gpio for Pins {
//! #     fn init_group(&mut self, _: PinGroup) {}
//! #     fn write_bit(&mut self, _: PinGroup, _: u8, _: Level) {}
//! #     fn read_bit(&self, _: PinGroup, _: u8) -> Level { unimplemented!() }
//! # }
//! # fn collaborators() -> (Adc, Pins, MemoryStore<1024>,
//! #     tekdaqc_core::time::SystemTime, BufferSink<4096>, BufferSink<1024>) { unimplemented!() }
//! let (adc, gpio, store, clock, output, errors) = collaborators();
//! let mut board = Board::new(BoardConfig::default(), adc, gpio, store, clock, output, errors);
//!
//! for byte in b"ADD_ANALOG_INPUT INPUT=3 GAIN=x4 NAME=Thermo\r" {
//!     board.receive(*byte);
//! }
//! loop {
//!     board.service();
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod board;
pub mod buffer;
pub mod calibration;
pub mod channel;
pub mod command;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod governor;
pub mod mux;
pub mod sampling;
pub mod settings;
pub mod time;
pub mod traits;

// Public API
pub use board::{Board, ServiceReport};
pub use config::BoardConfig;
pub use errors::{CommandError, CommandResult, FunctionError, FunctionResult};
pub use command::{Command, Handoff, Request};
pub use governor::{GovernorConfig, ThroughputGovernor};
pub use settings::{BufferSetting, Gain, Level, Rate, Scale};

/// Firmware version reported by IDENTIFY
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
