//! Error types for the board core
//!
//! Every operation reachable from the command protocol returns one of these
//! values rather than aborting. The `Display` strings are what a connected
//! client sees, so they follow the board's long-standing wire spelling
//! (`"AIN: INPUT NOT FOUND"`, `"COMMAND: BAD PARAMETER"` and so on).
//!
//! ## Error Categories
//!
//! ### Function errors
//! Raised by a subsystem while carrying out a command that parsed cleanly:
//! - `InputOutOfRange`, `InputNotFound`, `InputExists`, `InputUnspecified`
//! - `ParseMissingKey`, `ParseError` for arguments the subsystem rejects
//! - `FailedWrite` when formatting or emitting output fails
//! - the calibration family (`CalibrationWriteFailed` etc.)
//!
//! ### Command errors
//! Raised by the dispatcher before any subsystem runs (`BadCommand`,
//! `BadParam`, `ParseError`) or wrapping a [`FunctionError`].
//!
//! ### Collaborator errors
//! - [`SinkError`]: the output consumer did not take the data
//! - [`StorageError`]: the non-volatile store failed
//!
//! ## Handling
//!
//! ```rust
//! use tekdaqc_core::errors::{CommandError, FunctionError, Subsystem};
//!
//! let err = CommandError::from(FunctionError::InputNotFound(Subsystem::AnalogInput));
//! match err {
//!     CommandError::Function(FunctionError::InputNotFound(_)) => {
//!         // tell the client which input is missing
//!     }
//!     _ => {}
//! }
//! ```
//!
//! All error types are `Copy` and carry no heap data.

use core::fmt;

use thiserror_no_std::Error;

/// Result type for subsystem operations
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Result type for dispatched commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Input subsystem a function error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    /// Analog inputs, reported as `AIN`
    AnalogInput,
    /// Digital inputs, reported as `DIN`
    DigitalInput,
}

impl Subsystem {
    /// Wire prefix used in error strings
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::AnalogInput => "AIN",
            Self::DigitalInput => "DIN",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Errors raised by a subsystem while executing a command
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionError {
    /// Physical input id is outside every known range
    #[error("{0}: INPUT OUT OF RANGE")]
    InputOutOfRange(Subsystem),

    /// A required key was not supplied
    #[error("{0}: PARSE MISSING KEY")]
    ParseMissingKey(Subsystem),

    /// The input exists but has not been added
    #[error("{0}: INPUT NOT FOUND")]
    InputNotFound(Subsystem),

    /// A value could not be parsed as its expected type
    #[error("{0}: PARSE ERROR")]
    ParseError(Subsystem),

    /// The input is already added
    #[error("{0}: INPUT EXISTS")]
    InputExists(Subsystem),

    /// No input was named
    #[error("{0}: INPUT UNSPECIFIED")]
    InputUnspecified(Subsystem),

    /// Formatting or emitting output failed
    #[error("{0}: FAILED WRITE")]
    FailedWrite(Subsystem),

    /// Calibration mode could not be entered
    #[error("CALIBRATION: MODE ENTRY FAILED")]
    CalibrationModeFailed,

    /// A calibration value could not be persisted, or writes are locked
    #[error("CALIBRATION: WRITE FAILED")]
    CalibrationWriteFailed,

    /// A calibration value could not be parsed
    #[error("CALIBRATION: PARSE ERROR")]
    CalibrationParseError,

    /// A calibration command lacked a required key
    #[error("CALIBRATION: PARSE MISSING KEY")]
    CalibrationMissingKey,

    /// The ADC driver reported a fault during a calibration routine
    #[error("ADC: DRIVER FAULT")]
    AdcFault,
}

/// Errors reported by the command dispatcher
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Too many arguments for the command
    #[error("COMMAND: BAD PARAMETER")]
    BadParam,

    /// Command name not recognized or not supported on this board
    #[error("COMMAND: BAD COMMAND")]
    BadCommand,

    /// Command line could not be tokenized
    #[error("COMMAND: PARSE ERROR")]
    ParseError,

    /// A subsystem rejected the command
    #[error("COMMAND: FUNCTION ERROR")]
    Function(#[from] FunctionError),

    /// Analog configuration refused while analog sampling runs
    #[error("COMMAND: INVALID ADC OPERATION")]
    AdcInvalidOperation,

    /// Digital configuration refused while digital sampling runs
    #[error("COMMAND: INVALID DIGITAL INPUT OPERATION")]
    DiInvalidOperation,

    /// Anything else
    #[error("COMMAND: UNKNOWN ERROR")]
    Unknown,
}

impl CommandError {
    /// Subsystem error carried by a function error, if any
    pub fn function_error(&self) -> Option<FunctionError> {
        match self {
            Self::Function(err) => Some(*err),
            _ => None,
        }
    }
}

/// Output consumer refused data
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Consumer is backlogged; retry later
    #[error("output sink full")]
    Full,
    /// Consumer went away
    #[error("output sink closed")]
    Closed,
}

/// Non-volatile store failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Nothing stored under the key
    #[error("no word stored at key {key:#06x}")]
    Missing {
        /// Storage key that was read
        key: u32,
    },
    /// The store rejected the write
    #[error("write to key {key:#06x} failed")]
    WriteFailed {
        /// Storage key that was written
        key: u32,
    },
    /// No room for another key
    #[error("store full")]
    Full,
}

#[cfg(feature = "defmt")]
impl defmt::Format for FunctionError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InputOutOfRange(s) => defmt::write!(fmt, "{}: INPUT OUT OF RANGE", s.prefix()),
            Self::ParseMissingKey(s) => defmt::write!(fmt, "{}: PARSE MISSING KEY", s.prefix()),
            Self::InputNotFound(s) => defmt::write!(fmt, "{}: INPUT NOT FOUND", s.prefix()),
            Self::ParseError(s) => defmt::write!(fmt, "{}: PARSE ERROR", s.prefix()),
            Self::InputExists(s) => defmt::write!(fmt, "{}: INPUT EXISTS", s.prefix()),
            Self::InputUnspecified(s) => defmt::write!(fmt, "{}: INPUT UNSPECIFIED", s.prefix()),
            Self::FailedWrite(s) => defmt::write!(fmt, "{}: FAILED WRITE", s.prefix()),
            Self::CalibrationModeFailed => defmt::write!(fmt, "CALIBRATION: MODE ENTRY FAILED"),
            Self::CalibrationWriteFailed => defmt::write!(fmt, "CALIBRATION: WRITE FAILED"),
            Self::CalibrationParseError => defmt::write!(fmt, "CALIBRATION: PARSE ERROR"),
            Self::CalibrationMissingKey => defmt::write!(fmt, "CALIBRATION: PARSE MISSING KEY"),
            Self::AdcFault => defmt::write!(fmt, "ADC: DRIVER FAULT"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::BadParam => defmt::write!(fmt, "COMMAND: BAD PARAMETER"),
            Self::BadCommand => defmt::write!(fmt, "COMMAND: BAD COMMAND"),
            Self::ParseError => defmt::write!(fmt, "COMMAND: PARSE ERROR"),
            Self::Function(err) => defmt::write!(fmt, "COMMAND: FUNCTION ERROR ({})", err),
            Self::AdcInvalidOperation => defmt::write!(fmt, "COMMAND: INVALID ADC OPERATION"),
            Self::DiInvalidOperation => {
                defmt::write!(fmt, "COMMAND: INVALID DIGITAL INPUT OPERATION")
            }
            Self::Unknown => defmt::write!(fmt, "COMMAND: UNKNOWN ERROR"),
        }
    }
}
