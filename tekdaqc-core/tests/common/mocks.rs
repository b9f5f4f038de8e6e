//! Collaborator mocks
//!
//! Everything records what the board asked of it so tests can assert on the
//! hardware traffic as well as on the protocol output.

use std::collections::VecDeque;

use tekdaqc_core::errors::{SinkError, StorageError};
use tekdaqc_core::settings::{BufferSetting, Gain, Level, Rate};
use tekdaqc_core::traits::{AdcDriver, AdcPin, ErrorSink, Gpio, NvStore, OutputSink, PinGroup};

/// Error raised by [`MockAdc`] when told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcFailure;

/// ADC that returns scripted codes
///
/// Once the script runs out every conversion returns `idle_code`.
#[derive(Debug, Default)]
pub struct MockAdc {
    pub codes: VecDeque<i32>,
    pub idle_code: i32,
    /// Polls answered with `WouldBlock` after each sync
    pub busy_polls: u8,
    pending: u8,
    pub pairs: Vec<(AdcPin, AdcPin)>,
    pub configs: Vec<(Rate, Gain, BufferSetting)>,
    pub conversions: usize,
    pub self_calibrations: usize,
    pub gain_calibrations: usize,
    pub gain_register: u32,
    pub fail_calibration: bool,
}

impl MockAdc {
    /// Queue codes for the next conversions
    pub fn script(&mut self, codes: &[i32]) {
        self.codes.extend(codes.iter().copied());
    }
}

impl AdcDriver for MockAdc {
    type Error = AdcFailure;

    fn select_input_pair(&mut self, positive: AdcPin, negative: AdcPin) -> Result<(), AdcFailure> {
        self.pairs.push((positive, negative));
        Ok(())
    }

    fn configure(&mut self, rate: Rate, gain: Gain, buffer: BufferSetting) -> Result<(), AdcFailure> {
        self.configs.push((rate, gain, buffer));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), AdcFailure> {
        self.pending = self.busy_polls;
        Ok(())
    }

    fn read_code(&mut self) -> nb::Result<i32, AdcFailure> {
        if self.pending > 0 {
            self.pending -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.conversions += 1;
        Ok(self.codes.pop_front().unwrap_or(self.idle_code))
    }

    fn self_calibrate(&mut self) -> Result<(), AdcFailure> {
        if self.fail_calibration {
            return Err(AdcFailure);
        }
        self.self_calibrations += 1;
        Ok(())
    }

    fn system_gain_calibrate(&mut self) -> Result<(), AdcFailure> {
        if self.fail_calibration {
            return Err(AdcFailure);
        }
        self.gain_calibrations += 1;
        Ok(())
    }

    fn gain_calibration_register(&mut self) -> Result<u32, AdcFailure> {
        Ok(self.gain_register)
    }
}

/// GPIO with settable digital input levels
#[derive(Debug, Default)]
pub struct MockGpio {
    pub inputs: [bool; 24],
    pub initialized: Vec<PinGroup>,
    pub writes: Vec<(PinGroup, u8, Level)>,
}

impl Gpio for MockGpio {
    fn init_group(&mut self, group: PinGroup) {
        self.initialized.push(group);
    }

    fn write_bit(&mut self, group: PinGroup, pin: u8, level: Level) {
        self.writes.push((group, pin, level));
    }

    fn read_bit(&self, group: PinGroup, pin: u8) -> Level {
        match group {
            PinGroup::DigitalInputs => Level::from_bit(self.inputs.get(pin as usize).copied().unwrap_or(false)),
            _ => Level::Low,
        }
    }
}

/// Output sink that keeps everything written, or refuses while `refuse` is set
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub text: String,
    pub refuse: bool,
    pub writes: usize,
    pub refused: usize,
}

impl CaptureSink {
    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl OutputSink for CaptureSink {
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        if self.refuse {
            self.refused += 1;
            return Err(SinkError::Full);
        }
        self.writes += 1;
        self.text.push_str(text);
        Ok(())
    }
}

/// Error sink that keeps every report
#[derive(Debug, Default)]
pub struct CaptureErrors {
    pub reports: Vec<String>,
}

impl CaptureErrors {
    pub fn clear(&mut self) {
        self.reports.clear();
    }

    pub fn last(&self) -> Option<&str> {
        self.reports.last().map(String::as_str)
    }
}

impl ErrorSink for CaptureErrors {
    fn report(&mut self, message: &str) {
        self.reports.push(message.to_owned());
    }
}

/// Store whose every access fails
#[derive(Debug, Default)]
pub struct FailingStore;

impl NvStore for FailingStore {
    fn read_word(&self, key: u32) -> Result<u16, StorageError> {
        Err(StorageError::Missing { key })
    }

    fn write_word(&mut self, key: u32, _value: u16) -> Result<(), StorageError> {
        Err(StorageError::WriteFailed { key })
    }
}
