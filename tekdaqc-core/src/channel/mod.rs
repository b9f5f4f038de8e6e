//! Channels and the channel registry
//!
//! A channel is a fixed slot for one physical input. Slots are created once
//! at start-up and never freed; adding a channel configures its slot and
//! marks it [`ChannelState::Added`], removing it restores the slot's
//! defaults.
//!
//! ```text
//! Analog ids   0 ..= 31   External  -> external mux selector
//!              32         Calibration
//!              33 ..= 35  Internal  -> ADC pin pair (supply rails)
//!              36         Internal  -> ADC pin pair (cold junction, always added)
//! Digital ids  0 ..= 23   one flat range
//! ```

use core::fmt::{self, Write};
use core::ops::Range;

use heapless::String;

use crate::constants::analog::{
    COLD_JUNCTION_INPUT, EXTERNAL_MUX_SELECTORS, NUM_ANALOG_INPUTS, NUM_EXT_ANALOG_INPUTS,
    OFFSET_CALIBRATION_INPUT, SUPPLY_3V3_INPUT, SUPPLY_5V_INPUT, SUPPLY_9V_INPUT,
};
use crate::constants::command::{PARAMETER_ALL, RANGE_DELIMITER, SET_DELIMITER};
use crate::errors::{FunctionError, FunctionResult, Subsystem};
use crate::traits::AdcPin;

pub mod analog;
pub mod digital;
pub mod registry;

pub use analog::{AnalogChannel, AnalogConfig, AnalogSample};
pub use digital::{DigitalChannel, DigitalConfig, DigitalSample};
pub use registry::{AnalogRegistry, ChannelRecord, DigitalRegistry, ListSection, Registry};

/// Lifecycle of a channel slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelState {
    /// Slot idle, not sampled
    #[default]
    NotAdded,
    /// Slot configured and eligible for sampling
    Added,
}

/// Internal inputs reached through the ADC's own multiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalInput {
    /// 9 V analog supply monitor
    Supply9V,
    /// 5 V analog supply monitor
    Supply5V,
    /// 3.3 V supply monitor
    Supply3V3,
    /// Cold junction temperature sensor
    ColdJunction,
    /// Route to the external multiplexer output
    ExternalPassThrough,
}

impl InternalInput {
    /// Differential ADC pins (positive, negative) for this input
    pub const fn pin_pair(&self) -> (AdcPin, AdcPin) {
        match self {
            Self::Supply9V => (AdcPin::Ain3, AdcPin::Common),
            Self::Supply5V => (AdcPin::Ain4, AdcPin::Common),
            Self::Supply3V3 => (AdcPin::Ain7, AdcPin::Common),
            Self::ColdJunction => (AdcPin::Ain6, AdcPin::Common),
            Self::ExternalPassThrough => (AdcPin::Ain0, AdcPin::Ain1),
        }
    }

    /// Listing name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Supply9V => "9V SUPPLY",
            Self::Supply5V => "5V SUPPLY",
            Self::Supply3V3 => "3.3V SUPPLY",
            Self::ColdJunction => "COLD JUNCTION",
            Self::ExternalPassThrough => "EXTERNAL ANALOG INPUT",
        }
    }
}

/// Category of an analog physical id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogInputKind {
    /// External input behind the analog mux, with its index
    External(u8),
    /// Offset calibration input
    Calibration,
    /// Internal input on the ADC mux
    Internal(InternalInput),
}

impl AnalogInputKind {
    /// Classify a physical id; `None` outside every range
    pub const fn classify(id: u8) -> Option<Self> {
        match id {
            id if (id as usize) < NUM_EXT_ANALOG_INPUTS => Some(Self::External(id)),
            OFFSET_CALIBRATION_INPUT => Some(Self::Calibration),
            SUPPLY_9V_INPUT => Some(Self::Internal(InternalInput::Supply9V)),
            SUPPLY_5V_INPUT => Some(Self::Internal(InternalInput::Supply5V)),
            SUPPLY_3V3_INPUT => Some(Self::Internal(InternalInput::Supply3V3)),
            COLD_JUNCTION_INPUT => Some(Self::Internal(InternalInput::ColdJunction)),
            _ => None,
        }
    }
}

/// Multiplexer route derived from an analog id
///
/// Exactly one variant applies to each id, fixed by its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxSelector {
    /// External mux address bits
    External(u16),
    /// Internal ADC pin pair
    Internal(InternalInput),
    /// Pass-through plus calibration select line
    Calibration,
}

impl MuxSelector {
    /// Route for `id`, `None` for an id outside every range
    pub const fn for_input(id: u8) -> Option<Self> {
        match AnalogInputKind::classify(id) {
            Some(AnalogInputKind::External(index)) => {
                Some(Self::External(EXTERNAL_MUX_SELECTORS[index as usize]))
            }
            Some(AnalogInputKind::Calibration) => Some(Self::Calibration),
            Some(AnalogInputKind::Internal(internal)) => Some(Self::Internal(internal)),
            None => None,
        }
    }
}

/// Channel name, bounded at compile time
pub type ChannelName<const L: usize> = String<L>;

/// Build a channel name, failing if `text` does not fit
pub fn channel_name<const L: usize>(text: &str, subsystem: Subsystem) -> FunctionResult<String<L>> {
    let mut name = String::new();
    name.push_str(text)
        .map_err(|_| FunctionError::ParseError(subsystem))?;
    Ok(name)
}

/// Set of physical ids named by an INPUT argument
///
/// Accepts `ALL`, a single id, an inclusive range `a-b`, or a comma
/// separated set `a,b,c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelSet {
    bits: u64,
    all: bool,
}

impl ChannelSet {
    /// Empty set
    pub const fn empty() -> Self {
        Self { bits: 0, all: false }
    }

    /// Every id in `ids`
    pub fn from_range(ids: Range<u8>) -> Self {
        let mut set = Self::empty();
        for id in ids {
            set.insert(id);
        }
        set
    }

    /// Every id below `limit`, flagged as `ALL`
    pub fn all(limit: u8) -> Self {
        let mut set = Self::from_range(0..limit);
        set.all = true;
        set
    }

    /// Parse an INPUT value for ids below `limit`
    ///
    /// `ALL` selects `0..all_limit`. An id at or above `limit` is
    /// `InputOutOfRange`; text that is not a channel list is `ParseError`.
    pub fn parse(text: &str, limit: u8, all_limit: u8, subsystem: Subsystem) -> FunctionResult<Self> {
        if text.is_empty() {
            return Err(FunctionError::InputUnspecified(subsystem));
        }
        if text.eq_ignore_ascii_case(PARAMETER_ALL) {
            return Ok(Self::all(all_limit));
        }

        let parse_id = |token: &str| -> FunctionResult<u8> {
            let token = token.trim();
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FunctionError::ParseError(subsystem));
            }
            let id: u32 = token
                .parse()
                .map_err(|_| FunctionError::InputOutOfRange(subsystem))?;
            if id >= u32::from(limit) {
                return Err(FunctionError::InputOutOfRange(subsystem));
            }
            Ok(id as u8)
        };

        let mut set = Self::empty();
        if let Some((first, last)) = text.split_once(RANGE_DELIMITER) {
            let (first, last) = (parse_id(first)?, parse_id(last)?);
            if first > last {
                return Err(FunctionError::ParseError(subsystem));
            }
            for id in first..=last {
                set.insert(id);
            }
        } else {
            for token in text.split(SET_DELIMITER) {
                set.insert(parse_id(token)?);
            }
        }
        Ok(set)
    }

    /// Add an id
    pub fn insert(&mut self, id: u8) {
        if id < 64 {
            self.bits |= 1 << id;
        }
    }

    /// Membership test
    pub const fn contains(&self, id: u8) -> bool {
        id < 64 && self.bits & (1 << id) != 0
    }

    /// True when built from `ALL`
    pub const fn is_all(&self) -> bool {
        self.all
    }

    /// Number of ids in the set
    pub const fn len(&self) -> u32 {
        self.bits.count_ones()
    }

    /// True for the empty set
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..64).filter(move |id| self.contains(*id))
    }
}

/// Human readable name of an analog physical input
pub fn analog_input_label(id: u8, out: &mut impl Write) -> fmt::Result {
    match AnalogInputKind::classify(id) {
        Some(AnalogInputKind::External(index)) => write!(out, "EXTERNAL {}", index),
        Some(AnalogInputKind::Calibration) => out.write_str("OFFSET CALIBRATION"),
        Some(AnalogInputKind::Internal(internal)) => out.write_str(internal.as_str()),
        None => out.write_str("INVALID INPUT"),
    }
}

const _: () = assert!(NUM_ANALOG_INPUTS <= 64, "channel sets hold at most 64 ids");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_analog_id_has_one_category() {
        for id in 0..NUM_ANALOG_INPUTS as u8 {
            let kind = AnalogInputKind::classify(id).expect("valid id");
            let selector = MuxSelector::for_input(id).expect("valid id");
            match kind {
                AnalogInputKind::External(_) => assert!(matches!(selector, MuxSelector::External(_))),
                AnalogInputKind::Calibration => assert_eq!(selector, MuxSelector::Calibration),
                AnalogInputKind::Internal(_) => assert!(matches!(selector, MuxSelector::Internal(_))),
            }
        }
        assert_eq!(AnalogInputKind::classify(NUM_ANALOG_INPUTS as u8), None);
    }

    #[test]
    fn channel_lists_parse_every_form() {
        let sub = Subsystem::AnalogInput;
        let single = ChannelSet::parse("5", 37, 32, sub).unwrap();
        assert_eq!(single.iter().collect::<heapless::Vec<u8, 4>>().as_slice(), &[5]);

        let range = ChannelSet::parse("2-4", 37, 32, sub).unwrap();
        assert_eq!(range.iter().collect::<heapless::Vec<u8, 4>>().as_slice(), &[2, 3, 4]);

        let set = ChannelSet::parse("1,7,3", 37, 32, sub).unwrap();
        assert_eq!(set.iter().collect::<heapless::Vec<u8, 4>>().as_slice(), &[1, 3, 7]);

        let all = ChannelSet::parse("all", 37, 32, sub).unwrap();
        assert!(all.is_all());
        assert_eq!(all.len(), 32);
        assert!(!all.contains(COLD_JUNCTION_INPUT));
    }

    #[test]
    fn channel_list_errors() {
        let sub = Subsystem::DigitalInput;
        assert_eq!(ChannelSet::parse("", 24, 24, sub), Err(FunctionError::InputUnspecified(sub)));
        assert_eq!(ChannelSet::parse("24", 24, 24, sub), Err(FunctionError::InputOutOfRange(sub)));
        assert_eq!(ChannelSet::parse("abc", 24, 24, sub), Err(FunctionError::ParseError(sub)));
        assert_eq!(ChannelSet::parse("5-2", 24, 24, sub), Err(FunctionError::ParseError(sub)));
        assert_eq!(ChannelSet::parse("1,,2", 24, 24, sub), Err(FunctionError::ParseError(sub)));
    }

    #[test]
    fn names_are_bounded() {
        let ok: FunctionResult<String<4>> = channel_name("abcd", Subsystem::AnalogInput);
        assert_eq!(ok.unwrap().as_str(), "abcd");
        let long: FunctionResult<String<4>> = channel_name("abcde", Subsystem::AnalogInput);
        assert_eq!(long, Err(FunctionError::ParseError(Subsystem::AnalogInput)));
    }
}
