//! GPIO access for the pins the core drives or reads

use crate::settings::Level;

/// Pin groups used by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinGroup {
    /// External analog multiplexer address lines
    ExternalMux,
    /// Offset calibration select line
    CalibrationControl,
    /// Digital input pins, one per digital input id
    DigitalInputs,
}

/// Bit-level GPIO access
pub trait Gpio {
    /// Configure every pin in a group for its role
    fn init_group(&mut self, group: PinGroup);

    /// Drive one pin of a group
    fn write_bit(&mut self, group: PinGroup, pin: u8, level: Level);

    /// Sample one pin of a group
    fn read_bit(&self, group: PinGroup, pin: u8) -> Level;
}
