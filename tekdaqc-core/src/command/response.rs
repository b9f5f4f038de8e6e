//! Response framing
//!
//! Every message sent to the client uses the same frame:
//!
//! ```text
//! \n\r--------------------\n\r
//! <Kind> Message\n\r
//! \tMessage: <body>\n\r
//! --------------------\n\r
//! 0x1E
//! ```

use core::fmt::{self, Write};

use heapless::String;

use crate::constants::command::{BATCH_TERMINATOR, SIZE_TOSTRING_BUFFER};
use crate::errors::{CommandError, SinkError};
use crate::traits::{ErrorSink, OutputSink};

const DIVIDER: &str = "--------------------";

/// Room for a full body plus the frame around it
pub const FRAME_CAPACITY: usize = SIZE_TOSTRING_BUFFER + 64;

/// A formatted frame
pub type Frame = String<FRAME_CAPACITY>;

/// Message kinds and their frame titles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Command outcome
    Status,
    /// Command failure
    Error,
    /// Data requested by a command
    CommandData,
    /// Diagnostic text
    Debug,
}

impl MessageKind {
    /// Frame title
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Error => "Error",
            Self::CommandData => "Command Data",
            Self::Debug => "Debug",
        }
    }
}

/// Write `body` framed as `kind` into `out`
pub fn frame(kind: MessageKind, body: &str, out: &mut impl Write) -> fmt::Result {
    write!(
        out,
        "\n\r{DIVIDER}\n\r{} Message\n\r\tMessage: {}\n\r{DIVIDER}\n\r{}",
        kind.title(),
        body,
        BATCH_TERMINATOR
    )
}

/// Frame `body` and hand it to `sink` in one write
pub fn send<S: OutputSink + ?Sized>(sink: &mut S, kind: MessageKind, body: &str) -> Result<(), SinkError> {
    let mut out = Frame::new();
    frame(kind, body, &mut out).map_err(|_| SinkError::Full)?;
    sink.write(&out)
}

/// Success status for a completed command
pub fn send_success<S: OutputSink + ?Sized>(sink: &mut S) -> Result<(), SinkError> {
    send(sink, MessageKind::Status, "SUCCESS - COMMAND: OK")
}

/// Body of the error frame for `err`
///
/// Bad parameters end with a period; function errors carry a detail line.
pub fn describe_error(err: &CommandError, out: &mut impl Write) -> fmt::Result {
    match err {
        CommandError::BadParam => write!(out, "FAIL - {}.", err),
        CommandError::Function(function) => {
            write!(out, "FAIL - {}:\n\r\tFunction Error: {}", err, function)
        }
        _ => write!(out, "FAIL - {}", err),
    }
}

/// Report `err` to the client through `errors`
pub fn report_error<E: ErrorSink + ?Sized>(errors: &mut E, err: &CommandError) {
    let mut body: String<SIZE_TOSTRING_BUFFER> = String::new();
    let mut out = Frame::new();
    // both buffers are far larger than any error text
    if describe_error(err, &mut body).is_ok() && frame(MessageKind::Error, &body, &mut out).is_ok() {
        errors.report(&out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FunctionError, Subsystem};
    use crate::traits::BufferSink;

    #[test]
    fn status_frame_layout() {
        let mut sink: BufferSink<256> = BufferSink::new();
        send_success(&mut sink).unwrap();
        assert_eq!(
            sink.as_str(),
            "\n\r--------------------\n\rStatus Message\n\r\tMessage: SUCCESS - COMMAND: OK\n\r--------------------\n\r\u{1E}"
        );
    }

    #[test]
    fn error_bodies_follow_board_wording() {
        let mut body: String<128> = String::new();
        describe_error(&CommandError::BadParam, &mut body).unwrap();
        assert_eq!(body.as_str(), "FAIL - COMMAND: BAD PARAMETER.");

        body.clear();
        let err = CommandError::from(FunctionError::InputExists(Subsystem::DigitalInput));
        describe_error(&err, &mut body).unwrap();
        assert_eq!(
            body.as_str(),
            "FAIL - COMMAND: FUNCTION ERROR:\n\r\tFunction Error: DIN: INPUT EXISTS"
        );

        body.clear();
        describe_error(&CommandError::BadCommand, &mut body).unwrap();
        assert_eq!(body.as_str(), "FAIL - COMMAND: BAD COMMAND");
    }

    #[test]
    fn error_frames_go_to_error_sink() {
        let mut errors: BufferSink<256> = BufferSink::new();
        report_error(&mut errors, &CommandError::ParseError);
        assert!(errors.as_str().contains("Error Message"));
        assert!(errors.as_str().contains("FAIL - COMMAND: PARSE ERROR"));
        assert!(errors.as_str().ends_with('\u{1E}'));
    }
}
