//! Analog channel records

use core::fmt::{self, Write};

use crate::buffer::SampleRing;
use crate::constants::analog::{
    ANALOG_INPUT_BUFFER_SIZE, CALIBRATION_INPUT_NAME, COLD_JUNCTION_INPUT, COLD_JUNCTION_NAME,
    DEFAULT_INPUT_NAME, MAX_ANALOG_INPUT_NAME_LENGTH, OFFSET_CALIBRATION_INPUT,
};
use crate::errors::{FunctionError, FunctionResult, Subsystem};
use crate::settings::{BufferSetting, Gain, Rate};
use crate::time::Timestamp;

use super::{analog_input_label, AnalogInputKind, ChannelName, ChannelState, MuxSelector};

/// One analog conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalogSample {
    /// Signed 24-bit ADC code
    pub code: i32,
    /// Conversion time
    pub timestamp: Timestamp,
}

/// Settings applied when an analog input is added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogConfig {
    /// Display name
    pub name: ChannelName<MAX_ANALOG_INPUT_NAME_LENGTH>,
    /// PGA gain
    pub gain: Gain,
    /// Output data rate
    pub rate: Rate,
    /// Input buffer
    pub buffer: BufferSetting,
}

impl Default for AnalogConfig {
    fn default() -> Self {
        let mut name = ChannelName::new();
        // fits: default name is shorter than the bound
        let _ = name.push_str(DEFAULT_INPUT_NAME);
        Self {
            name,
            gain: Gain::X1,
            rate: Rate::Sps60,
            buffer: BufferSetting::Disabled,
        }
    }
}

impl AnalogConfig {
    /// Default settings under another name
    pub fn named(name: &str) -> FunctionResult<Self> {
        Ok(Self {
            name: super::channel_name(name, Subsystem::AnalogInput)?,
            ..Self::default()
        })
    }

    /// Fixed settings of the cold junction channel
    pub fn cold_junction() -> Self {
        let mut name = ChannelName::new();
        let _ = name.push_str(COLD_JUNCTION_NAME);
        Self {
            name,
            gain: Gain::X4,
            rate: Rate::Sps3750,
            buffer: BufferSetting::Enabled,
        }
    }
}

/// Analog input slot
#[derive(Debug)]
pub struct AnalogChannel {
    id: u8,
    state: ChannelState,
    config: AnalogConfig,
    selector: Option<MuxSelector>,
    samples: SampleRing<AnalogSample, ANALOG_INPUT_BUFFER_SIZE>,
    min_code: Option<i32>,
    max_code: Option<i32>,
}

impl AnalogChannel {
    /// Slot for `id` in its initial state
    ///
    /// The cold junction starts added with its fixed settings.
    pub fn new(id: u8) -> Self {
        let mut channel = Self {
            id,
            state: ChannelState::NotAdded,
            config: AnalogConfig::default(),
            selector: MuxSelector::for_input(id),
            samples: SampleRing::new(),
            min_code: None,
            max_code: None,
        };
        if id == COLD_JUNCTION_INPUT {
            channel.config = AnalogConfig::cold_junction();
            channel.state = ChannelState::Added;
        } else if id == OFFSET_CALIBRATION_INPUT {
            channel.config.name.clear();
            let _ = channel.config.name.push_str(CALIBRATION_INPUT_NAME);
        }
        channel
    }

    /// Physical id
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Lifecycle state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// True once added
    pub fn is_added(&self) -> bool {
        self.state == ChannelState::Added
    }

    /// Current settings
    pub fn config(&self) -> &AnalogConfig {
        &self.config
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Mux route for this id
    pub fn selector(&self) -> Option<MuxSelector> {
        self.selector
    }

    /// Category of this id
    pub fn kind(&self) -> Option<AnalogInputKind> {
        AnalogInputKind::classify(self.id)
    }

    /// True for the cold junction slot
    pub fn is_cold_junction(&self) -> bool {
        self.id == COLD_JUNCTION_INPUT
    }

    /// Buffered samples
    pub fn samples(&self) -> &SampleRing<AnalogSample, ANALOG_INPUT_BUFFER_SIZE> {
        &self.samples
    }

    /// Smallest and largest code seen since the slot was added
    pub fn code_extremes(&self) -> Option<(i32, i32)> {
        self.min_code.zip(self.max_code)
    }

    /// Append a conversion result
    pub fn record(&mut self, code: i32, timestamp: Timestamp) {
        self.samples.write(AnalogSample { code, timestamp });
        self.min_code = Some(self.min_code.map_or(code, |min| min.min(code)));
        self.max_code = Some(self.max_code.map_or(code, |max| max.max(code)));
    }

    pub(super) fn activate(&mut self, config: AnalogConfig) {
        self.config = config;
        self.state = ChannelState::Added;
        self.clear_history();
    }

    pub(super) fn deactivate(&mut self) {
        *self = Self::new(self.id);
    }

    fn clear_history(&mut self) {
        self.samples.reset();
        self.min_code = None;
        self.max_code = None;
    }

    /// Write the listing entry for this channel
    pub fn describe(&self, out: &mut impl Write) -> fmt::Result {
        let origin = match self.kind() {
            Some(AnalogInputKind::Internal(_)) => "Internal Input",
            _ => "External Input",
        };
        write!(out, "\t\tPhysical Input {}:\n\r\t\t\t{}: ", self.id, origin)?;
        analog_input_label(self.id, out)?;
        write!(
            out,
            "\n\r\t\t\tName: {}\n\r\t\t\tGain: {}\n\r\t\t\tRate: {}\n\r\t\t\tBuffer: {}\n\r",
            self.config.name, self.config.gain, self.config.rate, self.config.buffer
        )
    }

    /// Write the data header that precedes exported samples
    pub fn write_data_header(&self, out: &mut impl Write) -> fmt::Result {
        write!(
            out,
            "\n\r--------------------\n\rAnalog Input\n\r\tName: {}\n\r\tPhysical Input: {}\n\r\tPGA: {}\n\r\tRate: {}\n\r\tBuffer Status: {}\n\r--------------------\n\r",
            self.config.name, self.id, self.config.gain, self.config.rate, self.config.buffer
        )
    }
}

/// Validate an add request for analog `id`
pub(super) fn check_addable(id: u8) -> FunctionResult<()> {
    match AnalogInputKind::classify(id) {
        None | Some(AnalogInputKind::Calibration) => {
            Err(FunctionError::InputOutOfRange(Subsystem::AnalogInput))
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_junction_starts_added() {
        let channel = AnalogChannel::new(COLD_JUNCTION_INPUT);
        assert!(channel.is_added());
        assert_eq!(channel.config().gain, Gain::X4);
        assert_eq!(channel.config().rate, Rate::Sps3750);
        assert_eq!(channel.config().buffer, BufferSetting::Enabled);
    }

    #[test]
    fn record_tracks_extremes() {
        let mut channel = AnalogChannel::new(3);
        assert_eq!(channel.code_extremes(), None);
        channel.record(10, 1);
        channel.record(-4, 2);
        channel.record(7, 3);
        assert_eq!(channel.code_extremes(), Some((-4, 10)));
        assert_eq!(channel.samples().len(), 3);
    }

    #[test]
    fn deactivate_restores_defaults() {
        let mut channel = AnalogChannel::new(3);
        channel.activate(AnalogConfig::named("Load").unwrap());
        channel.record(1, 1);
        channel.deactivate();
        assert!(!channel.is_added());
        assert_eq!(channel.name(), DEFAULT_INPUT_NAME);
        assert!(channel.samples().is_empty());
        assert_eq!(channel.code_extremes(), None);
    }

    #[test]
    fn describe_lists_settings() {
        let mut channel = AnalogChannel::new(5);
        channel.activate(AnalogConfig::named("Test").unwrap());
        let mut out: heapless::String<256> = heapless::String::new();
        channel.describe(&mut out).unwrap();
        assert!(out.contains("Physical Input 5:"));
        assert!(out.contains("Name: Test"));
        assert!(out.contains("Rate: 60"));
    }
}
