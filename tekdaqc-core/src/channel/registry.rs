//! Channel registry
//!
//! Owns every channel slot of one kind in a fixed array indexed by
//! physical id. Callers reach channels through the id-checked accessors
//! below, never by raw index, so the id partition cannot be bypassed.
//!
//! ## Lifecycle rules
//!
//! - `add` requires the slot to be `NotAdded`; an added slot answers
//!   `InputExists` and keeps its configuration.
//! - `remove` resets the slot to its start-up defaults. Protected slots (the
//!   cold junction and the calibration input) ignore it.
//! - Every check happens before the slot is touched, so a failed call
//!   leaves the registry as it was.

use core::fmt;
use core::ops::Range;

use heapless::String;

use crate::constants::analog::{
    COLD_JUNCTION_INPUT, NUM_ANALOG_INPUTS, NUM_EXT_ANALOG_INPUTS, OFFSET_CALIBRATION_INPUT,
};
use crate::constants::command::SIZE_TOSTRING_BUFFER;
use crate::constants::digital::NUM_DIGITAL_INPUTS;
use crate::errors::{FunctionError, FunctionResult, Subsystem};
use crate::traits::OutputSink;

use super::analog::{self, AnalogChannel, AnalogConfig};
use super::digital::{DigitalChannel, DigitalConfig};
use super::ChannelState;

/// Group of ids listed under one heading
#[derive(Debug, Clone)]
pub struct ListSection {
    /// Heading written before the group, even when it is empty
    pub header: &'static str,
    /// Ids in the group
    pub ids: Range<u8>,
}

/// Behavior a slot type provides to the registry
pub trait ChannelRecord {
    /// Settings accepted by `add`
    type Config;

    /// Subsystem used in error reports
    const SUBSYSTEM: Subsystem;

    /// Slot for `id` in its start-up state
    fn blank(id: u8) -> Self;

    /// Lifecycle state
    fn state(&self) -> ChannelState;

    /// Slots that cannot be removed
    fn is_protected(id: u8) -> bool;

    /// Reject ids that exist but cannot be added
    fn check_addable(id: u8) -> FunctionResult<()>;

    /// Apply `config` and mark the slot added
    fn activate(&mut self, config: Self::Config);

    /// Restore start-up state
    fn deactivate(&mut self);

    /// Listing entry
    fn describe(&self, out: &mut String<SIZE_TOSTRING_BUFFER>) -> fmt::Result;

    /// Listing layout
    fn list_sections() -> &'static [ListSection];
}

/// Fixed table of channel slots
#[derive(Debug)]
pub struct Registry<C, const N: usize> {
    channels: [C; N],
}

/// All analog inputs
pub type AnalogRegistry = Registry<AnalogChannel, NUM_ANALOG_INPUTS>;

/// All digital inputs
pub type DigitalRegistry = Registry<DigitalChannel, NUM_DIGITAL_INPUTS>;

impl<C: ChannelRecord, const N: usize> Registry<C, N> {
    /// Every slot in its start-up state
    pub fn new() -> Self {
        Self {
            channels: core::array::from_fn(|id| C::blank(id as u8)),
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slot for `id`, added or not
    pub fn get(&self, id: u8) -> FunctionResult<&C> {
        self.channels
            .get(id as usize)
            .ok_or(FunctionError::InputNotFound(C::SUBSYSTEM))
    }

    /// Slot for `id`, only if added
    pub fn get_added(&self, id: u8) -> FunctionResult<&C> {
        let channel = self.get(id)?;
        match channel.state() {
            ChannelState::Added => Ok(channel),
            ChannelState::NotAdded => Err(FunctionError::InputNotFound(C::SUBSYSTEM)),
        }
    }

    /// Mutable slot for `id`, only if added
    pub fn get_added_mut(&mut self, id: u8) -> FunctionResult<&mut C> {
        let channel = self
            .channels
            .get_mut(id as usize)
            .ok_or(FunctionError::InputNotFound(C::SUBSYSTEM))?;
        match channel.state() {
            ChannelState::Added => Ok(channel),
            ChannelState::NotAdded => Err(FunctionError::InputNotFound(C::SUBSYSTEM)),
        }
    }

    /// Validate an add without applying it
    pub fn check_add(&self, id: Option<u8>) -> FunctionResult<u8> {
        let id = id.ok_or(FunctionError::InputUnspecified(C::SUBSYSTEM))?;
        if id as usize >= N {
            return Err(FunctionError::InputOutOfRange(C::SUBSYSTEM));
        }
        C::check_addable(id)?;
        if self.channels[id as usize].state() == ChannelState::Added {
            return Err(FunctionError::InputExists(C::SUBSYSTEM));
        }
        Ok(id)
    }

    /// Configure slot `id` and mark it added
    pub fn add(&mut self, id: Option<u8>, config: C::Config) -> FunctionResult<()> {
        let id = self.check_add(id)?;
        self.channels[id as usize].activate(config);
        log_debug!("{} input {} added", C::SUBSYSTEM.prefix(), id);
        Ok(())
    }

    /// Reset slot `id`; protected slots are left alone
    pub fn remove(&mut self, id: u8) -> FunctionResult<()> {
        if id as usize >= N {
            return Err(FunctionError::InputOutOfRange(C::SUBSYSTEM));
        }
        if C::is_protected(id) {
            log_debug!("{} input {} is protected, remove ignored", C::SUBSYSTEM.prefix(), id);
            return Ok(());
        }
        self.channels[id as usize].deactivate();
        Ok(())
    }

    /// Added slots in id order
    pub fn iter_added(&self) -> impl Iterator<Item = &C> + '_ {
        self.channels
            .iter()
            .filter(|channel| channel.state() == ChannelState::Added)
    }

    /// Mutable added slots in id order
    pub fn iter_added_mut(&mut self) -> impl Iterator<Item = &mut C> + '_ {
        self.channels
            .iter_mut()
            .filter(|channel| channel.state() == ChannelState::Added)
    }

    /// Number of added slots
    pub fn added_count(&self) -> usize {
        self.iter_added().count()
    }

    /// Write the listing of added slots to `sink`
    ///
    /// Each entry is formatted completely before it is written, so a
    /// formatting failure stops the listing between entries.
    pub fn list<S: OutputSink + ?Sized>(&self, sink: &mut S) -> FunctionResult<()> {
        let failed = FunctionError::FailedWrite(C::SUBSYSTEM);
        let mut entry: String<SIZE_TOSTRING_BUFFER> = String::new();

        for section in C::list_sections() {
            sink.write(section.header).map_err(|_| failed)?;
            for id in section.ids.clone() {
                let Some(channel) = self.channels.get(id as usize) else {
                    continue;
                };
                if channel.state() != ChannelState::Added {
                    continue;
                }
                entry.clear();
                channel.describe(&mut entry).map_err(|_| failed)?;
                sink.write(&entry).map_err(|_| failed)?;
            }
        }
        Ok(())
    }
}

impl<C: ChannelRecord, const N: usize> Default for Registry<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

static ANALOG_SECTIONS: [ListSection; 2] = [
    ListSection {
        header: "\n\r--------------------\n\rAdded Analog Inputs\n\r\tExternal Inputs:\n\r",
        ids: 0..NUM_EXT_ANALOG_INPUTS as u8,
    },
    ListSection {
        header: "\n\r\tInternal Inputs:\n\r",
        ids: NUM_EXT_ANALOG_INPUTS as u8..NUM_ANALOG_INPUTS as u8,
    },
];

static DIGITAL_SECTIONS: [ListSection; 1] = [ListSection {
    header: "\n\r----------\n\rAdded Digital Inputs\n\r----------\n\r",
    ids: 0..NUM_DIGITAL_INPUTS as u8,
}];

impl ChannelRecord for AnalogChannel {
    type Config = AnalogConfig;
    const SUBSYSTEM: Subsystem = Subsystem::AnalogInput;

    fn blank(id: u8) -> Self {
        AnalogChannel::new(id)
    }

    fn state(&self) -> ChannelState {
        AnalogChannel::state(self)
    }

    fn is_protected(id: u8) -> bool {
        id == COLD_JUNCTION_INPUT || id == OFFSET_CALIBRATION_INPUT
    }

    fn check_addable(id: u8) -> FunctionResult<()> {
        analog::check_addable(id)
    }

    fn activate(&mut self, config: AnalogConfig) {
        AnalogChannel::activate(self, config)
    }

    fn deactivate(&mut self) {
        AnalogChannel::deactivate(self)
    }

    fn describe(&self, out: &mut String<SIZE_TOSTRING_BUFFER>) -> fmt::Result {
        AnalogChannel::describe(self, out)
    }

    fn list_sections() -> &'static [ListSection] {
        &ANALOG_SECTIONS
    }
}

impl ChannelRecord for DigitalChannel {
    type Config = DigitalConfig;
    const SUBSYSTEM: Subsystem = Subsystem::DigitalInput;

    fn blank(id: u8) -> Self {
        DigitalChannel::new(id)
    }

    fn state(&self) -> ChannelState {
        DigitalChannel::state(self)
    }

    fn is_protected(_id: u8) -> bool {
        false
    }

    fn check_addable(_id: u8) -> FunctionResult<()> {
        Ok(())
    }

    fn activate(&mut self, config: DigitalConfig) {
        DigitalChannel::activate(self, config)
    }

    fn deactivate(&mut self) {
        DigitalChannel::deactivate(self)
    }

    fn describe(&self, out: &mut String<SIZE_TOSTRING_BUFFER>) -> fmt::Result {
        DigitalChannel::describe(self, out)
    }

    fn list_sections() -> &'static [ListSection] {
        &DIGITAL_SECTIONS
    }
}
