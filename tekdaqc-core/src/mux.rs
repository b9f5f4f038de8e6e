//! Analog multiplexer controller
//!
//! One ADC serves every analog input. Internal inputs are reached through
//! the ADC's own input mux; external inputs pass through a 32:1 external
//! mux whose output feeds the ADC's pass-through pin pair. After an
//! external switch the input filter needs time to settle, so selection arms
//! a deadline and the sampling loop polls [`MuxController::is_settling_complete`]
//! instead of sleeping.
//!
//! ```text
//!            select(external, settle)            now >= deadline
//!   Idle ───────────────────────────▶ SettlingExternal ──────────▶ Ready
//!     │                                                              ▲
//!     └──────── select(internal | calibration | no settle) ──────────┘
//! ```
//!
//! Selecting an unknown id reports an error and leaves the state as it was.

use core::fmt::Write;

use heapless::String;

use crate::channel::{InternalInput, MuxSelector};
use crate::constants::analog::{EXT_MUX_ADDRESS_LINES, EXT_MUX_ADDRESS_SHIFT};
use crate::errors::{FunctionError, FunctionResult, Subsystem};
use crate::settings::Level;
use crate::time::Timestamp;
use crate::traits::{AdcDriver, ErrorSink, Gpio, PinGroup};

/// Calibration control line level routing the external mux to the ADC
const EXT_ANALOG_SELECT: Level = Level::High;

/// Calibration control line level routing the offset calibration short
const OCAL_SELECT: Level = Level::Low;

/// Pin of the calibration control line in its group
const OCAL_CONTROL_PIN: u8 = 0;

/// Multiplexer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxState {
    /// Nothing selected since start-up
    Idle,
    /// External input selected, not yet settled
    SettlingExternal {
        /// Time at which conversions become trustworthy
        deadline: Timestamp,
    },
    /// Selected input may be converted
    Ready,
}

/// Drives the internal and external multiplexers
#[derive(Debug)]
pub struct MuxController {
    state: MuxState,
    settle_ms: u64,
    selected: Option<u8>,
    external: Option<u8>,
}

impl MuxController {
    /// Controller using `settle_ms` as the external settling delay
    pub const fn new(settle_ms: u64) -> Self {
        Self {
            state: MuxState::Idle,
            settle_ms,
            selected: None,
            external: None,
        }
    }

    /// Configure the mux pins
    pub fn init<G: Gpio>(&mut self, gpio: &mut G) {
        gpio.init_group(PinGroup::ExternalMux);
        gpio.init_group(PinGroup::CalibrationControl);
    }

    /// Current state
    pub fn state(&self) -> MuxState {
        self.state
    }

    /// Physical id most recently selected
    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    /// True once a selected input may be converted
    pub fn is_settling_complete(&self, now: Timestamp) -> bool {
        match self.state {
            MuxState::Idle => false,
            MuxState::SettlingExternal { deadline } => now >= deadline,
            MuxState::Ready => true,
        }
    }

    /// Advance `SettlingExternal` to `Ready` once the deadline passed
    pub fn poll(&mut self, now: Timestamp) -> MuxState {
        if let MuxState::SettlingExternal { deadline } = self.state {
            if now >= deadline {
                self.state = MuxState::Ready;
            }
        }
        self.state
    }

    /// Route physical input `id` to the ADC
    ///
    /// With `settle`, an external selection arms the settling deadline;
    /// internal and calibration selections never wait.
    pub fn select<A, G, E>(
        &mut self,
        id: u8,
        settle: bool,
        now: Timestamp,
        adc: &mut A,
        gpio: &mut G,
        errors: &mut E,
    ) -> FunctionResult<()>
    where
        A: AdcDriver,
        G: Gpio,
        E: ErrorSink + ?Sized,
    {
        let Some(selector) = MuxSelector::for_input(id) else {
            let mut message: String<64> = String::new();
            let _ = write!(
                message,
                "Attempted to select an input which does not exist: {}.",
                id
            );
            errors.report(&message);
            log_warn!("mux select rejected for input {}", id);
            return Err(FunctionError::InputOutOfRange(Subsystem::AnalogInput));
        };

        match selector {
            MuxSelector::External(bits) => {
                select_internal(adc, InternalInput::ExternalPassThrough)?;
                gpio.write_bit(PinGroup::CalibrationControl, OCAL_CONTROL_PIN, EXT_ANALOG_SELECT);
                write_address(gpio, bits);
                self.external = Some(id);
                self.state = if settle {
                    MuxState::SettlingExternal {
                        deadline: now.saturating_add(self.settle_ms),
                    }
                } else {
                    MuxState::Ready
                };
            }
            MuxSelector::Internal(internal) => {
                select_internal(adc, internal)?;
                self.state = MuxState::Ready;
            }
            MuxSelector::Calibration => {
                select_internal(adc, InternalInput::ExternalPassThrough)?;
                gpio.write_bit(PinGroup::CalibrationControl, OCAL_CONTROL_PIN, OCAL_SELECT);
                self.state = MuxState::Ready;
            }
        }

        self.selected = Some(id);
        Ok(())
    }

    /// Return to the external pass-through route without a settling delay
    ///
    /// Used after transient internal reads such as the cold junction. The
    /// external mux address is left as it was.
    pub fn reset_to_previous<A, G>(&mut self, adc: &mut A, gpio: &mut G) -> FunctionResult<()>
    where
        A: AdcDriver,
        G: Gpio,
    {
        select_internal(adc, InternalInput::ExternalPassThrough)?;
        gpio.write_bit(PinGroup::CalibrationControl, OCAL_CONTROL_PIN, EXT_ANALOG_SELECT);
        self.selected = self.external;
        self.state = MuxState::Ready;
        Ok(())
    }
}

fn select_internal<A: AdcDriver>(adc: &mut A, input: InternalInput) -> FunctionResult<()> {
    let (positive, negative) = input.pin_pair();
    adc.select_input_pair(positive, negative).map_err(|_err| {
        log_error!("ADC input pair selection failed: {:?}", _err);
        FunctionError::AdcFault
    })
}

fn write_address<G: Gpio>(gpio: &mut G, bits: u16) {
    for line in 0..EXT_MUX_ADDRESS_LINES {
        let pin = EXT_MUX_ADDRESS_SHIFT + line;
        gpio.write_bit(PinGroup::ExternalMux, pin, Level::from_bit(bits & (1 << pin) != 0));
    }
}
