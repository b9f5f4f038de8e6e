//! ADC driver interface
//!
//! Covers the operations the core needs from the 24-bit delta-sigma ADC.
//! The SPI protocol, register map and DRDY handling live in the driver.

use core::fmt::Debug;

use crate::settings::{BufferSetting, Gain, Rate};

/// ADC input pins available to the input multiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdcPin {
    /// AIN0
    Ain0,
    /// AIN1
    Ain1,
    /// AIN2
    Ain2,
    /// AIN3
    Ain3,
    /// AIN4
    Ain4,
    /// AIN5
    Ain5,
    /// AIN6
    Ain6,
    /// AIN7
    Ain7,
    /// AINCOM
    Common,
}

/// Operations the core needs from the ADC driver
///
/// `read_code` is non-blocking: it returns `nb::Error::WouldBlock` until a
/// conversion started after the last `sync` is ready.
pub trait AdcDriver {
    /// Driver fault type
    type Error: Debug;

    /// Route a differential pin pair to the converter
    fn select_input_pair(&mut self, positive: AdcPin, negative: AdcPin) -> Result<(), Self::Error>;

    /// Apply acquisition settings
    fn configure(&mut self, rate: Rate, gain: Gain, buffer: BufferSetting) -> Result<(), Self::Error>;

    /// Restart conversions so the next result reflects the current input
    fn sync(&mut self) -> Result<(), Self::Error>;

    /// Fetch the latest conversion result as a signed 24-bit code
    fn read_code(&mut self) -> nb::Result<i32, Self::Error>;

    /// Run the chip's self offset and gain calibration
    fn self_calibrate(&mut self) -> Result<(), Self::Error>;

    /// Run a system gain calibration against the currently selected input
    fn system_gain_calibrate(&mut self) -> Result<(), Self::Error>;

    /// Read back the gain calibration register
    fn gain_calibration_register(&mut self) -> Result<u32, Self::Error>;
}
