//! Digital channel records

use core::fmt::{self, Write};

use crate::buffer::SampleRing;
use crate::constants::analog::DEFAULT_INPUT_NAME;
use crate::constants::digital::{DIGITAL_INPUT_BUFFER_SIZE, MAX_DIGITAL_INPUT_NAME_LENGTH};
use crate::errors::{FunctionResult, Subsystem};
use crate::settings::Level;
use crate::time::Timestamp;

use super::{ChannelName, ChannelState};

/// One digital input reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitalSample {
    /// Level read
    pub level: Level,
    /// Read time
    pub timestamp: Timestamp,
}

/// Settings applied when a digital input is added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalConfig {
    /// Display name
    pub name: ChannelName<MAX_DIGITAL_INPUT_NAME_LENGTH>,
}

impl Default for DigitalConfig {
    fn default() -> Self {
        let mut name = ChannelName::new();
        let _ = name.push_str(DEFAULT_INPUT_NAME);
        Self { name }
    }
}

impl DigitalConfig {
    /// Config with the given name
    pub fn named(name: &str) -> FunctionResult<Self> {
        Ok(Self {
            name: super::channel_name(name, Subsystem::DigitalInput)?,
        })
    }
}

/// Digital input slot
#[derive(Debug)]
pub struct DigitalChannel {
    id: u8,
    state: ChannelState,
    config: DigitalConfig,
    level: Level,
    last_sample: Option<Timestamp>,
    samples: SampleRing<DigitalSample, DIGITAL_INPUT_BUFFER_SIZE>,
}

impl DigitalChannel {
    /// Slot for `id` in its initial state
    pub fn new(id: u8) -> Self {
        Self {
            id,
            state: ChannelState::NotAdded,
            config: DigitalConfig::default(),
            level: Level::Low,
            last_sample: None,
            samples: SampleRing::new(),
        }
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

    /// Display name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Most recent level
    pub fn level(&self) -> Level {
        self.level
    }

    /// Time of the most recent reading
    pub fn last_sample(&self) -> Option<Timestamp> {
        self.last_sample
    }

    /// Buffered readings
    pub fn samples(&self) -> &SampleRing<DigitalSample, DIGITAL_INPUT_BUFFER_SIZE> {
        &self.samples
    }

    /// Store a reading
    pub fn record(&mut self, level: Level, timestamp: Timestamp) {
        self.level = level;
        self.last_sample = Some(timestamp);
        self.samples.write(DigitalSample { level, timestamp });
    }

    pub(super) fn activate(&mut self, config: DigitalConfig) {
        self.config = config;
        self.state = ChannelState::Added;
        self.level = Level::Low;
        self.last_sample = None;
        self.samples.reset();
    }

    pub(super) fn deactivate(&mut self) {
        *self = Self::new(self.id);
    }

    /// Listing entry
    pub fn describe(&self, out: &mut impl Write) -> fmt::Result {
        write!(
            out,
            "\tPhysical Input {}:\n\r\t\tName: {}\n\r",
            self.id, self.config.name
        )
    }

    /// Header that precedes exported readings
    pub fn write_data_header(&self, out: &mut impl Write) -> fmt::Result {
        write!(
            out,
            "\n\r--------------------\n\rDigital Input\n\r\tName: {}\n\r\tPhysical Input: {}\n\r--------------------\n\r",
            self.config.name, self.id
        )
    }
}
