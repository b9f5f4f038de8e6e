//! Board orchestration
//!
//! [`Board`] owns every piece of board state and the injected
//! collaborators. The transport feeds it bytes with [`Board::receive`]; the
//! main loop calls [`Board::service`] as often as it can.
//!
//! ```text
//!  receive(byte) ──▶ SharedLineBuffer ──┐
//!                                        ▼
//!  service() ──▶ execute(line) ──▶ parse ──▶ Request ──▶ apply
//!      │
//!      ├──▶ Sampler::poll_analog / poll_digital ──▶ channel rings
//!      │
//!      └──▶ export_analog / export_digital ──▶ OutputSink
//!                     │
//!                     └──▶ ThroughputGovernor ──▶ slower digital scans
//! ```
//!
//! Registry mutations are refused while sampling of the same subsystem is
//! running, so an add or remove never races a conversion.

use core::fmt::Write;

use heapless::String;

use crate::calibration::{
    compute_gain_calibration, compute_system_offset_calibration, read_gain_calibration,
    BoardTemperature, CalibrationTable,
};
use crate::channel::{AnalogRegistry, ChannelSet, DigitalRegistry};
use crate::command::{
    parse_line, report_error, send, send_success, Handoff, LineStatus, MessageKind, Request,
    SharedLineBuffer,
};
use crate::config::BoardConfig;
use crate::constants::analog::NUM_ANALOG_INPUTS;
use crate::constants::calibration::{ADDR_BOARD_SERIAL, BOARD_SERIAL_NUM_LENGTH, ERASED_WORD};
use crate::constants::command::SIZE_TOSTRING_BUFFER;
use crate::constants::digital::NUM_DIGITAL_INPUTS;
use crate::errors::{CommandError, CommandResult, FunctionError, Subsystem};
use crate::export::{deliver_notice, export_analog, export_digital, ExportOutcome};
use crate::governor::ThroughputGovernor;
use crate::mux::MuxController;
use crate::sampling::{SampleEvent, Sampler};
use crate::traits::{AdcDriver, ErrorSink, Gpio, NvStore, OutputSink, PinGroup, TimeSource};
use crate::VERSION;

type Body = String<SIZE_TOSTRING_BUFFER>;

/// Board serial number
pub type SerialNumber = String<BOARD_SERIAL_NUM_LENGTH>;

/// What one [`Board::service`] pass did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceReport {
    /// Result of the command executed this pass, if a line was pending
    pub command: Option<CommandResult<Option<Handoff>>>,
    /// Analog scheduler step
    pub analog: SampleEvent,
    /// Digital scheduler step
    pub digital: SampleEvent,
    /// Samples released by accepted batches
    pub delivered: usize,
    /// Batches the sink refused
    pub refused: usize,
}

/// The data acquisition board
///
/// Generic over its collaborators: the ADC driver `A`, GPIO ports `G`,
/// non-volatile store `S`, clock `T`, and the output and error sinks `O`
/// and `E` toward the connected client.
pub struct Board<A, G, S, T, O, E> {
    config: BoardConfig,
    analog: AnalogRegistry,
    digital: DigitalRegistry,
    mux: MuxController,
    sampler: Sampler,
    governor: ThroughputGovernor,
    table: CalibrationTable,
    temperature: BoardTemperature,
    serial: Option<SerialNumber>,
    line: SharedLineBuffer,
    adc: A,
    gpio: G,
    store: S,
    clock: T,
    output: O,
    errors: E,
}

impl<A, G, S, T, O, E> Board<A, G, S, T, O, E>
where
    A: AdcDriver,
    G: Gpio,
    S: NvStore,
    T: TimeSource,
    O: OutputSink,
    E: ErrorSink,
{
    /// Bring up the board core around its collaborators
    ///
    /// Configures the mux and digital input pins and loads the persisted
    /// calibration table, temperature extremes and serial number.
    pub fn new(config: BoardConfig, adc: A, mut gpio: G, store: S, clock: T, output: O, errors: E) -> Self {
        let mut mux = MuxController::new(config.mux_settle_ms);
        mux.init(&mut gpio);
        gpio.init_group(PinGroup::DigitalInputs);

        let mut table = CalibrationTable::new();
        table.load(&store);
        let mut temperature =
            BoardTemperature::new(config.calibration_window, config.track_temperature_extremes);
        temperature.load(&store);
        let serial = load_serial(&store);

        log_info!("board core {} up, serial {:?}", VERSION, serial);

        Self {
            config,
            analog: AnalogRegistry::new(),
            digital: DigitalRegistry::new(),
            mux,
            sampler: Sampler::new(config.cold_junction_interval),
            governor: ThroughputGovernor::new(config.governor),
            table,
            temperature,
            serial,
            line: SharedLineBuffer::new(),
            adc,
            gpio,
            store,
            clock,
            output,
            errors,
        }
    }

    /// Feed one received byte into the command line buffer
    ///
    /// Safe to call from the receive interrupt.
    pub fn receive(&self, byte: u8) -> LineStatus {
        self.line.push(byte)
    }

    /// Line buffer shared with the receive path
    pub fn line_buffer(&self) -> &SharedLineBuffer {
        &self.line
    }

    /// Execute one command line and answer it
    ///
    /// Success is answered with a status frame on the output sink; any
    /// failure with an error frame on the error sink. A failed command
    /// leaves board state unchanged.
    pub fn execute(&mut self, line: &str) -> CommandResult<Option<Handoff>> {
        let result = self.run(line);
        match &result {
            Ok(_) => {
                if let Err(_err) = send_success(&mut self.output) {
                    log_warn!("success status not delivered: {}", _err);
                }
            }
            Err(err) => {
                log_warn!("command `{}` failed: {}", line, err);
                report_error(&mut self.errors, err);
            }
        }
        result
    }

    /// One pass of the main loop
    ///
    /// Executes a pending command line, advances sampling, exports one
    /// batch per channel with buffered samples, and feeds every export
    /// outcome to the governor.
    pub fn service(&mut self) -> ServiceReport {
        let command = self.line.take_line().map(|line| self.execute(&line));

        let now = self.clock.now();
        let analog = self.sampler.poll_analog(
            now,
            &mut self.analog,
            &mut self.mux,
            &mut self.temperature,
            &mut self.store,
            &mut self.adc,
            &mut self.gpio,
            &mut self.errors,
        );
        let digital = self.sampler.poll_digital(
            now,
            &mut self.digital,
            &mut self.gpio,
            &self.governor,
            self.config.digital_period_ms,
        );

        let mut report = ServiceReport {
            command,
            analog,
            digital,
            delivered: 0,
            refused: 0,
        };
        self.export(now, &mut report);
        deliver_notice(&mut self.governor, &mut self.output);
        report
    }

    fn export(&mut self, now: u64, report: &mut ServiceReport) {
        let batch = self.config.effective_batch();
        let temperature = self.temperature.current();

        for channel in self.analog.iter_added() {
            let outcome = export_analog(channel, &self.table, temperature, &self.store, batch, &mut self.output);
            tally(outcome, now, report, &mut self.governor, &mut self.errors);
        }
        for channel in self.digital.iter_added() {
            let outcome = export_digital(channel, batch, &mut self.output);
            tally(outcome, now, report, &mut self.governor, &mut self.errors);
        }
    }

    /// Stop all sampling
    pub fn halt(&mut self) {
        self.sampler.halt();
        log_info!("sampling halted");
    }

    fn run(&mut self, line: &str) -> CommandResult<Option<Handoff>> {
        let parsed = parse_line(line)?;
        let request = Request::from_parsed(&parsed)?;

        if self.sampler.analog_active() && request.touches_analog() {
            return Err(CommandError::AdcInvalidOperation);
        }
        if self.sampler.digital_active() && request.touches_digital() {
            return Err(CommandError::DiInvalidOperation);
        }
        self.apply(request)
    }

    fn apply(&mut self, request: Request) -> CommandResult<Option<Handoff>> {
        let now = self.clock.now();

        match request {
            Request::ListAnalogInputs => self.analog.list(&mut self.output)?,
            Request::ReadAnalogInput { inputs, count } => {
                self.sampler.start_analog(inputs, count, &self.analog)?;
                self.update_input_count();
            }
            Request::AddAnalogInput { id, config } => self.analog.add(Some(id), config)?,
            Request::RemoveAnalogInput { inputs } => {
                for id in inputs.iter() {
                    self.analog.remove(id)?;
                }
            }
            Request::CheckAnalogInput { id } => {
                let failed = FunctionError::FailedWrite(Subsystem::AnalogInput);
                let mut body = Body::new();
                self.analog.get_added(id)?.describe(&mut body).map_err(|_| failed)?;
                self.send_data(MessageKind::CommandData, &body, failed)?;
            }
            Request::SetAnalogInputScale(scale) => {
                self.table.set_scale(scale);
                self.table.load(&self.store);
            }
            Request::GetAnalogInputScale => {
                let failed = FunctionError::FailedWrite(Subsystem::AnalogInput);
                let mut body = Body::new();
                write!(body, "Current Analog Input Voltage Scale: {}", self.table.scale().token())
                    .map_err(|_| failed)?;
                self.send_data(MessageKind::CommandData, &body, failed)?;
            }
            Request::SystemCal => compute_system_offset_calibration(&mut self.adc)?,
            Request::SystemGainCal { input, params } => {
                self.mux
                    .select(input, false, now, &mut self.adc, &mut self.gpio, &mut self.errors)?;
                let calibrated = compute_gain_calibration(&mut self.adc, params);
                self.mux.reset_to_previous(&mut self.adc, &mut self.gpio)?;
                calibrated?;
            }
            Request::ReadSelfGainCal(params) => {
                params.apply(&mut self.adc)?;
                compute_system_offset_calibration(&mut self.adc)?;
                self.report_gain_register()?;
            }
            Request::ReadSystemGainCal => self.report_gain_register()?,
            Request::ListDigitalInputs => self.digital.list(&mut self.output)?,
            Request::ReadDigitalInput { inputs, count } => {
                self.sampler.start_digital(inputs, count, &self.digital, now)?;
                self.update_input_count();
            }
            Request::AddDigitalInput { id, config } => self.digital.add(Some(id), config)?,
            Request::RemoveDigitalInput { inputs } => {
                for id in inputs.iter() {
                    self.digital.remove(id)?;
                }
            }
            Request::Sample { count } => {
                self.sampler.halt();
                self.sampler
                    .start_analog(ChannelSet::all(NUM_ANALOG_INPUTS as u8), count, &self.analog)?;
                self.sampler.start_digital(
                    ChannelSet::all(NUM_DIGITAL_INPUTS as u8),
                    count,
                    &self.digital,
                    now,
                )?;
                self.update_input_count();
            }
            Request::Halt => self.halt(),
            Request::GetCalibrationStatus => {
                let failed = FunctionError::FailedWrite(Subsystem::AnalogInput);
                let status = if self.calibration_valid() { "VALID" } else { "INVALID" };
                let mut body = Body::new();
                write!(body, "Calibration Status: {}", status).map_err(|_| failed)?;
                self.send_data(MessageKind::Status, &body, failed)?;
            }
            Request::EnterCalibrationMode => self.table.enter_mode(&mut self.store)?,
            Request::WriteGainCalibrationValue { value, params, scale, bin } => self.table.write_entry(
                value,
                params.rate,
                params.gain,
                params.buffer,
                scale,
                bin,
                &mut self.store,
            )?,
            Request::WriteCalibrationTemp { temperature, bin } => {
                self.table.write_temperature(temperature, bin, &mut self.store)?
            }
            Request::WriteCalibrationValid => self.table.mark_valid(&mut self.store)?,
            Request::ExitCalibrationMode => {
                self.table.exit_mode();
                self.table.load(&self.store);
            }
            Request::SetBoardSerialNum(serial) => {
                if self.serial.is_some() {
                    log_warn!("serial number already programmed");
                    return Err(FunctionError::CalibrationWriteFailed.into());
                }
                store_serial(&mut self.store, &serial)?;
                self.serial = Some(serial);
            }
            Request::Identify => {
                let failed = FunctionError::FailedWrite(Subsystem::AnalogInput);
                let mut body = Body::new();
                write!(
                    body,
                    "Board Identity\n\r\tSerial Number: {}\n\r\tFirmware Version: {}",
                    self.serial.as_deref().unwrap_or("None"),
                    VERSION
                )
                .map_err(|_| failed)?;
                self.send_data(MessageKind::CommandData, &body, failed)?;
            }
            Request::None => {}
            Request::Handoff(handoff) => {
                self.halt();
                return Ok(Some(handoff));
            }
        }
        Ok(None)
    }

    fn report_gain_register(&mut self) -> CommandResult<()> {
        let failed = FunctionError::FailedWrite(Subsystem::AnalogInput);
        let value = read_gain_calibration(&mut self.adc)?;
        let mut body = Body::new();
        write!(body, "Gain calibration value: 0x{:X}", value).map_err(|_| failed)?;
        self.send_data(MessageKind::CommandData, &body, failed)
    }

    fn send_data(&mut self, kind: MessageKind, body: &str, failed: FunctionError) -> CommandResult<()> {
        send(&mut self.output, kind, body).map_err(|_err| {
            log_warn!("{} message not delivered: {}", kind.title(), _err);
            CommandError::from(failed)
        })
    }

    fn update_input_count(&mut self) {
        let count = self.sampler.input_count(&self.analog, &self.digital);
        self.governor.set_input_count(count);
    }

    /// True when the stored table is marked valid and the board has stayed
    /// inside the calibration temperature window
    pub fn calibration_valid(&self) -> bool {
        self.table.is_marked_valid() && self.temperature.is_calibration_valid()
    }

    /// Active configuration
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Analog channel registry
    pub fn analog(&self) -> &AnalogRegistry {
        &self.analog
    }

    /// Digital channel registry
    pub fn digital(&self) -> &DigitalRegistry {
        &self.digital
    }

    /// Mux controller
    pub fn mux(&self) -> &MuxController {
        &self.mux
    }

    /// Sampling scheduler
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Throughput governor
    pub fn governor(&self) -> &ThroughputGovernor {
        &self.governor
    }

    /// Calibration table
    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// Board temperature monitor
    pub fn temperature(&self) -> &BoardTemperature {
        &self.temperature
    }

    /// Programmed serial number
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// ADC driver
    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// Mutable ADC driver
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// GPIO ports
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// Non-volatile store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Clock
    pub fn clock(&self) -> &T {
        &self.clock
    }

    /// Output sink
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Mutable output sink
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Error sink
    pub fn errors(&self) -> &E {
        &self.errors
    }

    /// Mutable error sink
    pub fn errors_mut(&mut self) -> &mut E {
        &mut self.errors
    }
}

fn tally<E: ErrorSink + ?Sized>(
    outcome: Result<ExportOutcome, FunctionError>,
    now: u64,
    report: &mut ServiceReport,
    governor: &mut ThroughputGovernor,
    errors: &mut E,
) {
    match outcome {
        Ok(outcome) => {
            if outcome.attempted() {
                let _event = governor.record_export(outcome.accepted(), now);
                log_debug!("governor: {:?}", _event);
            }
            match outcome {
                ExportOutcome::Delivered(count) => report.delivered += count,
                ExportOutcome::Refused => report.refused += 1,
                ExportOutcome::Empty => {}
            }
        }
        Err(err) => report_error(errors, &CommandError::Function(err)),
    }
}

/// Two ASCII characters per word, low byte first, zero padded
fn store_serial<S: NvStore + ?Sized>(store: &mut S, serial: &str) -> CommandResult<()> {
    if serial.is_empty() || !serial.is_ascii() {
        return Err(FunctionError::CalibrationParseError.into());
    }
    let bytes = serial.as_bytes();
    for word in 0..BOARD_SERIAL_NUM_LENGTH / 2 {
        let low = bytes.get(word * 2).copied().unwrap_or(0);
        let high = bytes.get(word * 2 + 1).copied().unwrap_or(0);
        store
            .write_word(ADDR_BOARD_SERIAL + word as u32, u16::from_le_bytes([low, high]))
            .map_err(|_err| {
                log_error!("serial number write failed: {}", _err);
                FunctionError::CalibrationWriteFailed
            })?;
    }
    log_info!("serial number programmed: {}", serial);
    Ok(())
}

fn load_serial<S: NvStore + ?Sized>(store: &S) -> Option<SerialNumber> {
    let mut serial = SerialNumber::new();
    'words: for word in 0..BOARD_SERIAL_NUM_LENGTH / 2 {
        let value = match store.read_word(ADDR_BOARD_SERIAL + word as u32) {
            Ok(value) if value != ERASED_WORD => value,
            _ => break,
        };
        for byte in value.to_le_bytes() {
            if byte == 0 || !byte.is_ascii() || serial.push(byte as char).is_err() {
                break 'words;
            }
        }
    }
    (!serial.is_empty()).then_some(serial)
}
