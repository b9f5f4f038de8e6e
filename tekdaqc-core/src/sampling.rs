//! Sampling scheduler
//!
//! Drives the single ADC across the selected analog inputs without ever
//! blocking. Each call to [`Sampler::poll_analog`] advances one step:
//!
//! ```text
//!        pick next input            mux settled             code ready
//!  Idle ────────────────▶ Settling ────────────▶ Converting ───────────▶ Idle
//!   │  (select via mux)             (configure + sync)      (record sample)
//!   └─ nothing left to sample ─▶ stopped
//! ```
//!
//! Inputs are visited in id order, one round at a time. The cold junction
//! is read first and then after every `cold_junction_interval` conversions;
//! its reading updates the board temperature and the mux is returned to
//! the external route afterwards.
//!
//! Digital inputs are scanned all at once every governor-adjusted period.
//!
//! A count of rounds bounds both kinds of sampling; zero means run until
//! halted.

use crate::calibration::{AcquisitionParams, BoardTemperature};
use crate::channel::{AnalogRegistry, ChannelSet, DigitalRegistry};
use crate::constants::analog::{COLD_JUNCTION_INPUT, NUM_ANALOG_INPUTS};
use crate::constants::digital::NUM_DIGITAL_INPUTS;
use crate::errors::{FunctionError, FunctionResult, Subsystem};
use crate::governor::ThroughputGovernor;
use crate::mux::MuxController;
use crate::time::Timestamp;
use crate::traits::{AdcDriver, ErrorSink, Gpio, NvStore, PinGroup};

/// Where the analog state machine is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogPhase {
    /// Between conversions
    Idle,
    /// Waiting for the mux to settle on `id`
    Settling {
        /// Input being sampled
        id: u8,
    },
    /// Conversion started on `id`
    Converting {
        /// Input being sampled
        id: u8,
    },
}

/// What one scheduler step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent {
    /// Sampling is not running
    Stopped,
    /// Waiting on the mux, the ADC or the scan period
    Waiting,
    /// Input `id` was selected
    Selected(u8),
    /// A conversion of input `id` was stored
    Converted {
        /// Input sampled
        id: u8,
        /// Raw code
        code: i32,
    },
    /// The cold junction was read
    ColdJunction {
        /// Board temperature in Celsius
        celsius: f32,
    },
    /// Every added digital input in the set was read
    DigitalScan {
        /// Inputs read
        inputs: u8,
    },
    /// The requested number of rounds is done
    Finished,
    /// A driver fault; the step was abandoned
    Fault,
}

#[derive(Debug, Clone, Copy, Default)]
struct Run {
    inputs: ChannelSet,
    rounds_left: Option<u32>,
}

impl Run {
    fn new(inputs: ChannelSet, count: u32) -> Self {
        Self {
            inputs,
            rounds_left: (count > 0).then_some(count),
        }
    }

    /// Count one finished round; true when no rounds remain
    fn finish_round(&mut self) -> bool {
        match self.rounds_left.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            None => false,
        }
    }
}

/// Non-blocking analog and digital sampling scheduler
#[derive(Debug, Clone)]
pub struct Sampler {
    analog: Option<Run>,
    digital: Option<Run>,
    phase: AnalogPhase,
    cursor: u8,
    converted_this_round: bool,
    since_cold_junction: u32,
    cold_junction_interval: u32,
    next_digital_scan: Timestamp,
}

impl Sampler {
    /// Idle scheduler reading the cold junction every `cold_junction_interval` conversions
    pub fn new(cold_junction_interval: u32) -> Self {
        let interval = cold_junction_interval.max(1);
        Self {
            analog: None,
            digital: None,
            phase: AnalogPhase::Idle,
            cursor: 0,
            converted_this_round: false,
            since_cold_junction: interval,
            cold_junction_interval: interval,
            next_digital_scan: 0,
        }
    }

    /// True while analog sampling runs
    pub fn analog_active(&self) -> bool {
        self.analog.is_some()
    }

    /// True while digital sampling runs
    pub fn digital_active(&self) -> bool {
        self.digital.is_some()
    }

    /// Current analog step
    pub fn phase(&self) -> AnalogPhase {
        self.phase
    }

    /// Begin sampling the analog inputs in `inputs`
    ///
    /// Inputs in the list that are not added are skipped. An explicit list
    /// naming no added input at all is refused; `ALL` samples whatever is
    /// added.
    pub fn start_analog(&mut self, inputs: ChannelSet, count: u32, registry: &AnalogRegistry) -> FunctionResult<()> {
        if !inputs.is_all() && !inputs.iter().any(|id| registry.get_added(id).is_ok()) {
            return Err(FunctionError::InputNotFound(Subsystem::AnalogInput));
        }
        self.analog = Some(Run::new(inputs, count));
        self.phase = AnalogPhase::Idle;
        self.cursor = 0;
        self.converted_this_round = false;
        self.since_cold_junction = self.cold_junction_interval;
        log_info!("analog sampling started, {} rounds", count);
        Ok(())
    }

    /// Begin sampling the digital inputs in `inputs`, first scan at `now`
    pub fn start_digital(
        &mut self,
        inputs: ChannelSet,
        count: u32,
        registry: &DigitalRegistry,
        now: Timestamp,
    ) -> FunctionResult<()> {
        if !inputs.is_all() && !inputs.iter().any(|id| registry.get_added(id).is_ok()) {
            return Err(FunctionError::InputNotFound(Subsystem::DigitalInput));
        }
        self.digital = Some(Run::new(inputs, count));
        self.next_digital_scan = now;
        log_info!("digital sampling started, {} rounds", count);
        Ok(())
    }

    /// Stop analog sampling; a conversion in flight is abandoned
    pub fn halt_analog(&mut self) {
        self.analog = None;
        self.phase = AnalogPhase::Idle;
    }

    /// Stop digital sampling
    pub fn halt_digital(&mut self) {
        self.digital = None;
    }

    /// Stop everything
    pub fn halt(&mut self) {
        self.halt_analog();
        self.halt_digital();
    }

    /// Number of added inputs the running sampling covers
    pub fn input_count(&self, analog: &AnalogRegistry, digital: &DigitalRegistry) -> u8 {
        let analog_count = self.analog.map_or(0, |run| {
            (0..NUM_ANALOG_INPUTS as u8)
                .filter(|id| eligible(run.inputs, analog, *id))
                .count()
        });
        let digital_count = self.digital.map_or(0, |run| {
            (0..NUM_DIGITAL_INPUTS as u8)
                .filter(|id| run.inputs.contains(*id) && digital.get_added(*id).is_ok())
                .count()
        });
        (analog_count + digital_count).min(u8::MAX as usize) as u8
    }

    /// Advance analog sampling by one step
    #[allow(clippy::too_many_arguments)]
    pub fn poll_analog<A, G, E, S>(
        &mut self,
        now: Timestamp,
        registry: &mut AnalogRegistry,
        mux: &mut MuxController,
        temperature: &mut BoardTemperature,
        store: &mut S,
        adc: &mut A,
        gpio: &mut G,
        errors: &mut E,
    ) -> SampleEvent
    where
        A: AdcDriver,
        G: Gpio,
        E: ErrorSink + ?Sized,
        S: NvStore + ?Sized,
    {
        let Some(run) = self.analog else {
            return SampleEvent::Stopped;
        };

        match self.phase {
            AnalogPhase::Idle => {
                let id = if self.since_cold_junction >= self.cold_junction_interval {
                    COLD_JUNCTION_INPUT
                } else {
                    match self.next_input(run, registry) {
                        Some(id) => id,
                        None => {
                            self.halt_analog();
                            log_info!("analog sampling finished");
                            return SampleEvent::Finished;
                        }
                    }
                };
                let settle = mux.selected() != Some(id);
                if mux.select(id, settle, now, adc, gpio, errors).is_err() {
                    return self.abandon(id);
                }
                self.phase = AnalogPhase::Settling { id };
                SampleEvent::Selected(id)
            }
            AnalogPhase::Settling { id } => {
                if !mux.is_settling_complete(now) {
                    return SampleEvent::Waiting;
                }
                mux.poll(now);
                let Ok(channel) = registry.get_added(id) else {
                    // removed while settling
                    self.phase = AnalogPhase::Idle;
                    return SampleEvent::Waiting;
                };
                let config = channel.config();
                let params = AcquisitionParams::new(config.rate, config.gain, config.buffer);
                if params.apply(adc).is_err() || adc.sync().is_err() {
                    return self.abandon(id);
                }
                self.phase = AnalogPhase::Converting { id };
                SampleEvent::Waiting
            }
            AnalogPhase::Converting { id } => match adc.read_code() {
                Err(nb::Error::WouldBlock) => SampleEvent::Waiting,
                Err(nb::Error::Other(_err)) => {
                    log_error!("conversion of input {} failed: {:?}", id, _err);
                    self.abandon(id)
                }
                Ok(code) => {
                    self.phase = AnalogPhase::Idle;
                    if id == COLD_JUNCTION_INPUT {
                        self.finish_cold_junction(code, now, registry, mux, temperature, store, adc, gpio)
                    } else {
                        if let Ok(channel) = registry.get_added_mut(id) {
                            channel.record(code, now);
                        }
                        self.since_cold_junction = self.since_cold_junction.saturating_add(1);
                        self.converted_this_round = true;
                        SampleEvent::Converted { id, code }
                    }
                }
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_cold_junction<A, G, S>(
        &mut self,
        code: i32,
        now: Timestamp,
        registry: &mut AnalogRegistry,
        mux: &mut MuxController,
        temperature: &mut BoardTemperature,
        store: &mut S,
        adc: &mut A,
        gpio: &mut G,
    ) -> SampleEvent
    where
        A: AdcDriver,
        G: Gpio,
        S: NvStore + ?Sized,
    {
        self.since_cold_junction = 0;
        let gain = match registry.get_added_mut(COLD_JUNCTION_INPUT) {
            Ok(channel) => {
                channel.record(code, now);
                channel.config().gain
            }
            Err(_) => return SampleEvent::Fault,
        };
        let celsius = match temperature.update(code, gain, store) {
            Ok(celsius) => celsius,
            Err(_err) => {
                log_warn!("board temperature extremes not persisted: {}", _err);
                temperature.current().unwrap_or_default()
            }
        };
        if mux.reset_to_previous(adc, gpio).is_err() {
            return SampleEvent::Fault;
        }
        SampleEvent::ColdJunction { celsius }
    }

    fn abandon(&mut self, id: u8) -> SampleEvent {
        log_warn!("sampling step for input {} abandoned", id);
        self.phase = AnalogPhase::Idle;
        if id == COLD_JUNCTION_INPUT {
            self.since_cold_junction = 0;
        }
        SampleEvent::Fault
    }

    /// Next input to convert, counting finished rounds
    fn next_input(&mut self, run: Run, registry: &AnalogRegistry) -> Option<u8> {
        if let Some(id) = self.scan_from(self.cursor, run, registry) {
            self.cursor = id + 1;
            return Some(id);
        }

        // end of a round
        let converted = core::mem::take(&mut self.converted_this_round);
        if !converted {
            return None;
        }
        let done = self.analog.as_mut().map_or(true, Run::finish_round);
        if done {
            return None;
        }
        let id = self.scan_from(0, run, registry)?;
        self.cursor = id + 1;
        Some(id)
    }

    fn scan_from(&self, start: u8, run: Run, registry: &AnalogRegistry) -> Option<u8> {
        (start..NUM_ANALOG_INPUTS as u8).find(|id| eligible(run.inputs, registry, *id))
    }

    /// Scan digital inputs when the period has elapsed
    pub fn poll_digital<G: Gpio>(
        &mut self,
        now: Timestamp,
        registry: &mut DigitalRegistry,
        gpio: &mut G,
        governor: &ThroughputGovernor,
        period_ms: u64,
    ) -> SampleEvent {
        let Some(mut run) = self.digital else {
            return SampleEvent::Stopped;
        };
        if now < self.next_digital_scan {
            return SampleEvent::Waiting;
        }

        let mut inputs = 0u8;
        for channel in registry.iter_added_mut() {
            let id = channel.id();
            if run.inputs.contains(id) {
                channel.record(gpio.read_bit(PinGroup::DigitalInputs, id), now);
                inputs += 1;
            }
        }
        if inputs == 0 || run.finish_round() {
            self.halt_digital();
            log_info!("digital sampling finished");
            return SampleEvent::Finished;
        }
        self.digital = Some(run);
        self.next_digital_scan = now.saturating_add(governor.effective_wait(period_ms));
        SampleEvent::DigitalScan { inputs }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(crate::constants::analog::COLD_JUNCTION_READ_INTERVAL)
    }
}

fn eligible(inputs: ChannelSet, registry: &AnalogRegistry, id: u8) -> bool {
    id != COLD_JUNCTION_INPUT && inputs.contains(id) && registry.get_added(id).is_ok()
}
