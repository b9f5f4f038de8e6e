//! Command line tokenizer
//!
//! A line has the form `COMMAND[ KEY=VALUE]*`. The command word is matched
//! case-insensitively against the board's command table; keys keep their
//! case and are matched exactly later, when the request is built. A key may
//! carry a `--` prefix.
//!
//! Tokenizing never touches board state. Every error found here is reported
//! before any subsystem runs.

use core::fmt;

use heapless::Vec;

use crate::constants::command::{
    KEY_VALUE_PAIR_FLAG, KEY_VALUE_SEPARATOR, MAX_COMMANDPART_LENGTH, MAX_NUM_ARGUMENTS,
};
use crate::errors::{CommandError, CommandResult};

use super::keys::Key;

macro_rules! commands {
    ($( $variant:ident => $text:literal [$($key:ident),*] ),+ $(,)?) => {
        /// Every command the board recognizes
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Command {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl Command {
            /// Every command in protocol order
            pub const ALL: &'static [Command] = &[$(Command::$variant),+];

            /// Wire spelling
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Keys this command understands, in protocol order
            pub const fn keys(&self) -> &'static [Key] {
                match self {
                    $(Self::$variant => &[$(Key::$key),*],)+
                }
            }
        }
    };
}

commands! {
    ListAnalogInputs => "LIST_ANALOG_INPUTS" [],
    ReadAdcRegisters => "READ_ADC_REGISTERS" [],
    ReadAnalogInput => "READ_ANALOG_INPUT" [Input, Number],
    AddAnalogInput => "ADD_ANALOG_INPUT" [Input, Buffer, Rate, Gain, Name],
    RemoveAnalogInput => "REMOVE_ANALOG_INPUT" [Input],
    CheckAnalogInput => "CHECK_ANALOG_INPUT" [Input],
    SetAnalogInputScale => "SET_ANALOG_INPUT_SCALE" [Scale],
    GetAnalogInputScale => "GET_ANALOG_INPUT_SCALE" [],
    SystemCal => "SYSTEM_CAL" [],
    SystemGcal => "SYSTEM_GCAL" [Input, Buffer, Rate, Gain],
    ReadSelfGcal => "READ_SELF_GCAL" [Buffer, Rate, Gain],
    ReadSystemGcal => "READ_SYSTEM_GCAL" [],
    ListDigitalInputs => "LIST_DIGITAL_INPUTS" [],
    ReadDigitalInput => "READ_DIGITAL_INPUT" [Input, Number],
    AddDigitalInput => "ADD_DIGITAL_INPUT" [Input, Name],
    RemoveDigitalInput => "REMOVE_DIGITAL_INPUT" [Input],
    AddPwmInput => "ADD_PWM_INPUT" [],
    RemovePwmInput => "REMOVE_PWM_INPUT" [],
    ReadPwmInput => "READ_PWM_INPUT" [],
    ListPwmInputs => "LIST_PWM_INPUTS" [],
    ListDigitalOutputs => "LIST_DIGITAL_OUTPUTS" [],
    SetDigitalOutput => "SET_DIGITAL_OUTPUT" [],
    ReadDigitalOutput => "READ_DIGITAL_OUTPUT" [],
    ReadDoDiags => "READ_DO_DIAGS" [],
    RemoveDigitalOutput => "REMOVE_DIGITAL_OUTPUT" [],
    ClearDigOutputFault => "CLEAR_DIG_OUTPUT_FAULT" [],
    SetPwmOutput => "SET_PWM_OUTPUT" [],
    SetPwmOutputTimer => "SET_PWM_OUTPUT_TIMER" [],
    Disconnect => "DISCONNECT" [],
    Reboot => "REBOOT" [],
    Upgrade => "UPGRADE" [],
    Identify => "IDENTIFY" [],
    Sample => "SAMPLE" [Number],
    Halt => "HALT" [],
    SetUserMac => "SET_USER_MAC" [],
    ClearUserMac => "CLEAR_USER_MAC" [],
    SetStaticIp => "SET_STATIC_IP" [],
    GetCalibrationStatus => "GET_CALIBRATION_STATUS" [],
    EnterCalibrationMode => "ENTER_CALIBRATION_MODE" [],
    WriteGainCalibrationValue => "WRITE_GAIN_CALIBRATION_VALUE" [Value, Gain, Rate, Buffer, Scale, Index],
    WriteCalibrationTemp => "WRITE_CALIBRATION_TEMP" [Temperature, Index],
    WriteCalibrationValid => "WRITE_CALIBRATION_VALID" [],
    ExitCalibrationMode => "EXIT_CALIBRATION_MODE" [],
    SetFactoryMacAddr => "SET_FACTORY_MAC_ADDR" [],
    SetBoardSerialNum => "SET_BOARD_SERIAL_NUM" [Value],
    UpdateFirmware => "UPDATE_FIRMWARE" [],
    None => "NONE" [],
}

impl Command {
    /// Look up a command word, ignoring case
    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.as_str().eq_ignore_ascii_case(word))
    }

    /// True when `key` belongs to this command's vocabulary
    pub fn accepts(&self, key: &str) -> bool {
        self.keys().iter().any(|known| known.matches(key))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `KEY=VALUE` argument, borrowed from the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument<'a> {
    /// Key text with any `--` prefix removed
    pub key: &'a str,
    /// Value text, possibly empty
    pub value: &'a str,
}

/// Tokenized command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Recognized command
    pub command: Command,
    args: Vec<Argument<'a>, MAX_NUM_ARGUMENTS>,
}

impl<'a> ParsedLine<'a> {
    /// Arguments in line order
    pub fn args(&self) -> &[Argument<'a>] {
        &self.args
    }

    /// Value of the first argument spelled exactly like `key`
    pub fn value(&self, key: Key) -> Option<&'a str> {
        self.args
            .iter()
            .find(|arg| key.matches(arg.key))
            .map(|arg| arg.value)
    }
}

/// Split a command line into its command and arguments
///
/// Keys the command does not understand are logged and dropped.
///
/// - empty line, unknown or overlong command word: `BadCommand`
/// - more recognized arguments than the command has keys, or an overlong
///   argument: `BadParam`
/// - an argument without `=`, or with an empty key: `ParseError`
pub fn parse_line(line: &str) -> CommandResult<ParsedLine<'_>> {
    let mut tokens = line.split_ascii_whitespace();
    let word = tokens.next().ok_or(CommandError::BadCommand)?;
    if word.len() >= MAX_COMMANDPART_LENGTH {
        return Err(CommandError::BadCommand);
    }
    let command = Command::parse(word).ok_or(CommandError::BadCommand)?;

    let limit = command.keys().len().min(MAX_NUM_ARGUMENTS);
    let mut args: Vec<Argument<'_>, MAX_NUM_ARGUMENTS> = Vec::new();
    for token in tokens {
        if token.len() >= MAX_COMMANDPART_LENGTH {
            return Err(CommandError::BadParam);
        }
        let token = token.strip_prefix(KEY_VALUE_PAIR_FLAG).unwrap_or(token);
        let (key, value) = token
            .split_once(KEY_VALUE_SEPARATOR)
            .ok_or(CommandError::ParseError)?;
        if key.is_empty() {
            return Err(CommandError::ParseError);
        }
        if !command.accepts(key) {
            log_debug!("{}: ignoring unknown key {}", command, key);
            continue;
        }
        if args.len() >= limit {
            return Err(CommandError::BadParam);
        }
        args.push(Argument { key, value })
            .map_err(|_| CommandError::BadParam)?;
    }

    Ok(ParsedLine { command, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_table_is_complete() {
        assert_eq!(Command::ALL.len(), 47);
        assert_eq!(Command::parse("list_analog_inputs"), Some(Command::ListAnalogInputs));
        assert_eq!(Command::parse("NONE"), Some(Command::None));
        assert_eq!(Command::parse("LIST"), None);
        for command in Command::ALL {
            assert_eq!(Command::parse(command.as_str()), Some(*command));
        }
    }

    #[test]
    fn splits_key_value_pairs() {
        let parsed = parse_line("ADD_ANALOG_INPUT INPUT=5 --NAME=Test RATE=").unwrap();
        assert_eq!(parsed.command, Command::AddAnalogInput);
        assert_eq!(parsed.value(Key::Input), Some("5"));
        assert_eq!(parsed.value(Key::Name), Some("Test"));
        assert_eq!(parsed.value(Key::Rate), Some(""));
        assert_eq!(parsed.value(Key::Gain), None);
    }

    #[test]
    fn first_matching_key_wins() {
        let parsed = parse_line("READ_ANALOG_INPUT INPUT=1 INPUT=2").unwrap();
        assert_eq!(parsed.value(Key::Input), Some("1"));
    }

    #[test]
    fn keys_match_case_sensitively() {
        let parsed = parse_line("add_digital_input input=3").unwrap();
        assert_eq!(parsed.value(Key::Input), None);
        assert!(parsed.args().is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let parsed = parse_line("ADD_DIGITAL_INPUT INPUT=3 NAME=A FOO=1").unwrap();
        assert_eq!(parsed.value(Key::Input), Some("3"));
        assert_eq!(parsed.value(Key::Name), Some("A"));
        assert_eq!(parsed.args().len(), 2);

        let halt = parse_line("HALT NUMBER=1 --VERBOSE=yes").unwrap();
        assert!(halt.args().is_empty());
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(parse_line("").unwrap_err(), CommandError::BadCommand);
        assert_eq!(parse_line("FROBNICATE").unwrap_err(), CommandError::BadCommand);
        assert_eq!(parse_line("ADD_DIGITAL_INPUT INPUT").unwrap_err(), CommandError::ParseError);
        assert_eq!(parse_line("ADD_DIGITAL_INPUT =4").unwrap_err(), CommandError::ParseError);
        assert_eq!(
            parse_line("CHECK_ANALOG_INPUT INPUT=1 INPUT=2").unwrap_err(),
            CommandError::BadParam
        );
        assert_eq!(
            parse_line("SAMPLE NUMBER=1 NUMBER=2").unwrap_err(),
            CommandError::BadParam
        );
        assert_eq!(
            parse_line("ADD_DIGITAL_INPUT NAME=ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789").unwrap_err(),
            CommandError::BadParam
        );
    }
}
