//! Typed requests built from parsed lines
//!
//! Every argument is parsed and validated here, before the board applies
//! anything. A request that builds successfully carries only well-formed
//! values, so executing it performs exactly one mutation or none.
//!
//! Optional keys and their defaults:
//!
//! | Command             | Key            | Default          |
//! |---------------------|----------------|------------------|
//! | `ADD_ANALOG_INPUT`  | BUFFER         | DISABLED         |
//! |                     | RATE           | 60               |
//! |                     | GAIN           | x1               |
//! |                     | NAME           | NONE             |
//! | `ADD_DIGITAL_INPUT` | NAME           | NONE             |
//! | `READ_*_INPUT`      | INPUT          | ALL              |
//! | `READ_*_INPUT`      | NUMBER         | 0 (continuous)   |
//! | `SAMPLE`            | NUMBER         | 0 (continuous)   |
//! | `SYSTEM_GCAL`       | BUFFER/RATE/GAIN | as above       |

use heapless::String;

use crate::calibration::AcquisitionParams;
use crate::channel::{AnalogConfig, ChannelSet, DigitalConfig};
use crate::constants::analog::NUM_ANALOG_INPUTS;
use crate::constants::calibration::BOARD_SERIAL_NUM_LENGTH;
use crate::constants::command::PARAMETER_ALL;
use crate::constants::digital::NUM_DIGITAL_INPUTS;
use crate::errors::{CommandError, CommandResult, FunctionError, FunctionResult, Subsystem};
use crate::settings::{BufferSetting, Gain, Rate, Scale};

use super::keys::{parse_float, parse_uint, Key};
use super::parser::{Command, ParsedLine};

/// Commands whose effect lies outside the board core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Close the client connection
    Disconnect,
    /// Restart the board
    Reboot,
    /// Enter the bootloader
    Upgrade,
}

/// Validated command ready to execute
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// List added analog inputs
    ListAnalogInputs,
    /// Sample analog inputs
    ReadAnalogInput {
        /// Inputs to sample
        inputs: ChannelSet,
        /// Rounds to run, 0 for continuous
        count: u32,
    },
    /// Add one analog input
    AddAnalogInput {
        /// Physical id
        id: u8,
        /// Settings to apply
        config: AnalogConfig,
    },
    /// Remove analog inputs
    RemoveAnalogInput {
        /// Inputs to remove
        inputs: ChannelSet,
    },
    /// Describe one added analog input
    CheckAnalogInput {
        /// Physical id
        id: u8,
    },
    /// Change the analog input scale
    SetAnalogInputScale(Scale),
    /// Report the analog input scale
    GetAnalogInputScale,
    /// ADC self offset calibration
    SystemCal,
    /// System gain calibration against a reference input
    SystemGainCal {
        /// Reference input
        input: u8,
        /// Settings calibrated
        params: AcquisitionParams,
    },
    /// Self calibrate at the given settings and report the gain register
    ReadSelfGainCal(AcquisitionParams),
    /// Report the gain register
    ReadSystemGainCal,
    /// List added digital inputs
    ListDigitalInputs,
    /// Sample digital inputs
    ReadDigitalInput {
        /// Inputs to sample
        inputs: ChannelSet,
        /// Rounds to run, 0 for continuous
        count: u32,
    },
    /// Add one digital input
    AddDigitalInput {
        /// Physical id
        id: u8,
        /// Settings to apply
        config: DigitalConfig,
    },
    /// Remove digital inputs
    RemoveDigitalInput {
        /// Inputs to remove
        inputs: ChannelSet,
    },
    /// Sample every added input
    Sample {
        /// Rounds to run, 0 for continuous
        count: u32,
    },
    /// Stop all sampling
    Halt,
    /// Report whether the calibration can be trusted
    GetCalibrationStatus,
    /// Start a calibration session
    EnterCalibrationMode,
    /// Store one gain correction factor
    WriteGainCalibrationValue {
        /// Correction factor
        value: f32,
        /// Settings the factor applies to
        params: AcquisitionParams,
        /// Input scale
        scale: Scale,
        /// Temperature bin
        bin: usize,
    },
    /// Store the temperature of a bin
    WriteCalibrationTemp {
        /// Celsius
        temperature: f32,
        /// Temperature bin
        bin: usize,
    },
    /// Mark the stored table valid
    WriteCalibrationValid,
    /// End the calibration session
    ExitCalibrationMode,
    /// Store the board serial number
    SetBoardSerialNum(String<BOARD_SERIAL_NUM_LENGTH>),
    /// Report serial number and firmware version
    Identify,
    /// Do nothing
    None,
    /// Pass control to the transport or bootloader
    Handoff(Handoff),
}

impl Request {
    /// Validate a parsed line into a request
    pub fn from_parsed(parsed: &ParsedLine<'_>) -> CommandResult<Self> {
        let analog = Subsystem::AnalogInput;
        let digital = Subsystem::DigitalInput;

        let request = match parsed.command {
            Command::ListAnalogInputs => Self::ListAnalogInputs,
            Command::ReadAnalogInput => Self::ReadAnalogInput {
                inputs: channel_list(parsed, analog, NUM_ANALOG_INPUTS)?,
                count: count(parsed, analog)?,
            },
            Command::AddAnalogInput => {
                let id = single_id(parsed, analog)?;
                let mut config = match parsed.value(Key::Name) {
                    Some(name) => AnalogConfig::named(name)?,
                    None => AnalogConfig::default(),
                };
                let params = acquisition_params(parsed, analog, false)?;
                config.rate = params.rate;
                config.gain = params.gain;
                config.buffer = params.buffer;
                Self::AddAnalogInput { id, config }
            }
            Command::RemoveAnalogInput => Self::RemoveAnalogInput {
                inputs: required_list(parsed, analog, NUM_ANALOG_INPUTS)?,
            },
            Command::CheckAnalogInput => Self::CheckAnalogInput {
                id: single_id(parsed, analog)?,
            },
            Command::SetAnalogInputScale => {
                let token = parsed
                    .value(Key::Scale)
                    .ok_or(FunctionError::ParseMissingKey(analog))?;
                Self::SetAnalogInputScale(
                    Scale::parse(token).ok_or(FunctionError::ParseError(analog))?,
                )
            }
            Command::GetAnalogInputScale => Self::GetAnalogInputScale,
            Command::SystemCal => Self::SystemCal,
            Command::SystemGcal => Self::SystemGainCal {
                input: single_id(parsed, analog)?,
                params: acquisition_params(parsed, analog, false)?,
            },
            Command::ReadSelfGcal => Self::ReadSelfGainCal(acquisition_params(parsed, analog, true)?),
            Command::ReadSystemGcal => Self::ReadSystemGainCal,
            Command::ListDigitalInputs => Self::ListDigitalInputs,
            Command::ReadDigitalInput => Self::ReadDigitalInput {
                inputs: channel_list(parsed, digital, NUM_DIGITAL_INPUTS)?,
                count: count(parsed, digital)?,
            },
            Command::AddDigitalInput => {
                let id = single_id(parsed, digital)?;
                let config = match parsed.value(Key::Name) {
                    Some(name) => DigitalConfig::named(name)?,
                    None => DigitalConfig::default(),
                };
                Self::AddDigitalInput { id, config }
            }
            Command::RemoveDigitalInput => Self::RemoveDigitalInput {
                inputs: required_list(parsed, digital, NUM_DIGITAL_INPUTS)?,
            },
            Command::Sample => Self::Sample {
                count: count(parsed, analog)?,
            },
            Command::Halt => Self::Halt,
            Command::GetCalibrationStatus => Self::GetCalibrationStatus,
            Command::EnterCalibrationMode => Self::EnterCalibrationMode,
            Command::WriteGainCalibrationValue => {
                let value = calibration_float(parsed, Key::Value)?;
                let gain = calibration_token(parsed, Key::Gain, Gain::parse)?;
                let rate = calibration_token(parsed, Key::Rate, Rate::parse)?;
                let buffer = calibration_token(parsed, Key::Buffer, BufferSetting::parse)?;
                let scale = calibration_token(parsed, Key::Scale, Scale::parse)?;
                let bin = calibration_index(parsed)?;
                Self::WriteGainCalibrationValue {
                    value,
                    params: AcquisitionParams::new(rate, gain, buffer),
                    scale,
                    bin,
                }
            }
            Command::WriteCalibrationTemp => Self::WriteCalibrationTemp {
                temperature: calibration_float(parsed, Key::Temperature)?,
                bin: calibration_index(parsed)?,
            },
            Command::WriteCalibrationValid => Self::WriteCalibrationValid,
            Command::ExitCalibrationMode => Self::ExitCalibrationMode,
            Command::SetBoardSerialNum => {
                let text = parsed
                    .value(Key::Value)
                    .ok_or(FunctionError::CalibrationMissingKey)?;
                let mut serial = String::new();
                if text.is_empty() || serial.push_str(text).is_err() {
                    return Err(FunctionError::CalibrationParseError.into());
                }
                Self::SetBoardSerialNum(serial)
            }
            Command::Identify => Self::Identify,
            Command::None => Self::None,
            Command::Disconnect => Self::Handoff(Handoff::Disconnect),
            Command::Reboot => Self::Handoff(Handoff::Reboot),
            Command::Upgrade => Self::Handoff(Handoff::Upgrade),
            Command::ReadAdcRegisters
            | Command::AddPwmInput
            | Command::RemovePwmInput
            | Command::ReadPwmInput
            | Command::ListPwmInputs
            | Command::ListDigitalOutputs
            | Command::SetDigitalOutput
            | Command::ReadDigitalOutput
            | Command::ReadDoDiags
            | Command::RemoveDigitalOutput
            | Command::ClearDigOutputFault
            | Command::SetPwmOutput
            | Command::SetPwmOutputTimer
            | Command::SetUserMac
            | Command::ClearUserMac
            | Command::SetStaticIp
            | Command::SetFactoryMacAddr
            | Command::UpdateFirmware => {
                log_debug!("{} is not supported on this board", parsed.command);
                return Err(CommandError::BadCommand);
            }
        };
        Ok(request)
    }

    /// True for requests that change the analog registry or drive the ADC
    pub fn touches_analog(&self) -> bool {
        matches!(
            self,
            Self::AddAnalogInput { .. }
                | Self::RemoveAnalogInput { .. }
                | Self::SystemCal
                | Self::SystemGainCal { .. }
                | Self::ReadSelfGainCal(_)
        )
    }

    /// True for requests that change the digital registry
    pub fn touches_digital(&self) -> bool {
        matches!(
            self,
            Self::AddDigitalInput { .. } | Self::RemoveDigitalInput { .. }
        )
    }
}

fn single_id(parsed: &ParsedLine<'_>, subsystem: Subsystem) -> FunctionResult<u8> {
    let text = parsed
        .value(Key::Input)
        .ok_or(FunctionError::ParseMissingKey(subsystem))?;
    if text.is_empty() {
        return Err(FunctionError::InputUnspecified(subsystem));
    }
    let id = parse_uint(text).ok_or(FunctionError::ParseError(subsystem))?;
    u8::try_from(id).map_err(|_| FunctionError::InputOutOfRange(subsystem))
}

fn channel_list(parsed: &ParsedLine<'_>, subsystem: Subsystem, limit: usize) -> FunctionResult<ChannelSet> {
    let text = parsed.value(Key::Input).unwrap_or(PARAMETER_ALL);
    ChannelSet::parse(text, limit as u8, limit as u8, subsystem)
}

fn required_list(parsed: &ParsedLine<'_>, subsystem: Subsystem, limit: usize) -> FunctionResult<ChannelSet> {
    let text = parsed
        .value(Key::Input)
        .ok_or(FunctionError::ParseMissingKey(subsystem))?;
    ChannelSet::parse(text, limit as u8, limit as u8, subsystem)
}

fn count(parsed: &ParsedLine<'_>, subsystem: Subsystem) -> FunctionResult<u32> {
    match parsed.value(Key::Number) {
        Some(text) => parse_uint(text).ok_or(FunctionError::ParseError(subsystem)),
        None => Ok(0),
    }
}

fn acquisition_params(
    parsed: &ParsedLine<'_>,
    subsystem: Subsystem,
    required: bool,
) -> FunctionResult<AcquisitionParams> {
    fn setting<T: Default>(
        parsed: &ParsedLine<'_>,
        key: Key,
        parse: fn(&str) -> Option<T>,
        subsystem: Subsystem,
        required: bool,
    ) -> FunctionResult<T> {
        match parsed.value(key) {
            Some(token) => parse(token).ok_or(FunctionError::ParseError(subsystem)),
            None if required => Err(FunctionError::ParseMissingKey(subsystem)),
            None => Ok(T::default()),
        }
    }

    Ok(AcquisitionParams::new(
        setting(parsed, Key::Rate, Rate::parse, subsystem, required)?,
        setting(parsed, Key::Gain, Gain::parse, subsystem, required)?,
        setting(parsed, Key::Buffer, BufferSetting::parse, subsystem, required)?,
    ))
}

fn calibration_float(parsed: &ParsedLine<'_>, key: Key) -> FunctionResult<f32> {
    let text = parsed
        .value(key)
        .ok_or(FunctionError::CalibrationMissingKey)?;
    parse_float(text).ok_or(FunctionError::CalibrationParseError)
}

fn calibration_token<T>(parsed: &ParsedLine<'_>, key: Key, parse: fn(&str) -> Option<T>) -> FunctionResult<T> {
    let text = parsed
        .value(key)
        .ok_or(FunctionError::CalibrationMissingKey)?;
    parse(text).ok_or(FunctionError::CalibrationParseError)
}

fn calibration_index(parsed: &ParsedLine<'_>) -> FunctionResult<usize> {
    let text = parsed
        .value(Key::Index)
        .ok_or(FunctionError::CalibrationMissingKey)?;
    parse_uint(text)
        .map(|bin| bin as usize)
        .ok_or(FunctionError::CalibrationParseError)
}
