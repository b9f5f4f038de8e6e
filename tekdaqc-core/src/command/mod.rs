//! Command protocol
//!
//! A command travels through four stages:
//!
//! 1. [`line`]: received bytes are edited into a complete line
//! 2. [`parser`]: the line is split into a [`Command`] and its arguments
//! 3. [`request`]: arguments are validated into a typed [`Request`]
//! 4. the board executes the request and answers through [`response`]
//!
//! Stages 1 to 3 never touch board state, so a malformed line is rejected
//! before anything changes.
//!
//! ```rust
//! use tekdaqc_core::command::{parse_line, Request};
//!
//! let parsed = parse_line("ADD_ANALOG_INPUT INPUT=5 NAME=Test").unwrap();
//! let request = Request::from_parsed(&parsed).unwrap();
//! assert!(matches!(request, Request::AddAnalogInput { id: 5, .. }));
//! ```

pub mod keys;
pub mod line;
pub mod parser;
pub mod request;
pub mod response;

pub use keys::{parse_float, parse_uint, Key};
pub use line::{Line, LineBuffer, LineStatus, SharedLineBuffer};
pub use parser::{parse_line, Argument, Command, ParsedLine};
pub use request::{Handoff, Request};
pub use response::{describe_error, report_error, send, send_success, MessageKind};
