//! Output toward the connected client
//!
//! [`OutputSink`] carries data records and command responses;
//! [`ErrorSink`] carries error messages. On the board both end up on the
//! telnet connection, but they are kept apart so a transport can prioritize
//! or tag them.

use heapless::String;

use crate::errors::SinkError;

/// Destination for outgoing text
pub trait OutputSink {
    /// Hand `text` to the consumer in one piece
    ///
    /// `Err(SinkError::Full)` means nothing was taken and the caller may
    /// retry later.
    fn write(&mut self, text: &str) -> Result<(), SinkError>;
}

/// Destination for error reports
pub trait ErrorSink {
    /// Report an error message; delivery is best effort
    fn report(&mut self, message: &str);
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        (**self).write(text)
    }
}

impl<T: ErrorSink + ?Sized> ErrorSink for &mut T {
    fn report(&mut self, message: &str) {
        (**self).report(message)
    }
}

/// Fixed-capacity text sink
///
/// Accepts whole writes while they fit and refuses with
/// [`SinkError::Full`] otherwise, which makes it a convenient stand-in for
/// a slow consumer.
#[derive(Debug, Default, Clone)]
pub struct BufferSink<const N: usize> {
    text: String<N>,
}

impl<const N: usize> BufferSink<N> {
    /// Empty sink
    pub const fn new() -> Self {
        Self { text: String::new() }
    }

    /// Everything accepted so far
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Drop accepted text, making room again
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Bytes still free
    pub fn remaining(&self) -> usize {
        N - self.text.len()
    }
}

impl<const N: usize> OutputSink for BufferSink<N> {
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        if text.len() > self.remaining() {
            return Err(SinkError::Full);
        }
        self.text.push_str(text).map_err(|_| SinkError::Full)
    }
}

impl<const N: usize> ErrorSink for BufferSink<N> {
    fn report(&mut self, message: &str) {
        // truncate at capacity
        for ch in message.chars() {
            if self.text.push(ch).is_err() {
                break;
            }
        }
    }
}
