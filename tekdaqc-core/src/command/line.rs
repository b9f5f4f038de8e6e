//! Command line assembly
//!
//! Bytes arrive one at a time from the transport. [`LineBuffer`] applies the
//! terminal editing rules; [`SharedLineBuffer`] wraps it for use from an
//! interrupt or a poll loop while the dispatcher runs elsewhere.
//!
//! Editing rules:
//!
//! - CR or LF completes the line; an empty line is ignored
//! - backspace and DEL remove the last character
//! - runs of spaces collapse to one and leading spaces are dropped
//! - NUL and non-ASCII bytes are ignored
//! - a line longer than the buffer is discarded whole when it completes

use core::cell::RefCell;
use core::fmt;
use core::mem;

use critical_section::Mutex;
use heapless::String;

use crate::constants::command::{BACKSPACE, DELETE, MAX_COMMANDLINE_LENGTH};

/// A completed command line
pub type Line = String<MAX_COMMANDLINE_LENGTH>;

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// Byte consumed, line still open
    Partial,
    /// A line is ready to be taken
    Complete,
    /// The finished line did not fit and was discarded
    Overflowed,
    /// A line finished while the previous one was still waiting; it was dropped
    Busy,
}

/// Single-owner line editor
#[derive(Debug, Default)]
pub struct LineBuffer {
    text: Line,
    overflowed: bool,
}

impl LineBuffer {
    /// Empty buffer
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            overflowed: false,
        }
    }

    /// Apply one received byte
    pub fn push(&mut self, byte: u8) -> LineStatus {
        match byte {
            b'\r' | b'\n' => {
                if self.overflowed {
                    self.clear();
                    return LineStatus::Overflowed;
                }
                if self.text.is_empty() {
                    LineStatus::Partial
                } else {
                    LineStatus::Complete
                }
            }
            BACKSPACE | DELETE => {
                self.text.pop();
                LineStatus::Partial
            }
            b' ' => {
                if !self.text.is_empty() && !self.text.ends_with(' ') {
                    self.append(' ');
                }
                LineStatus::Partial
            }
            0x21..=0x7E | b'\t' => {
                self.append(byte as char);
                LineStatus::Partial
            }
            _ => LineStatus::Partial,
        }
    }

    fn append(&mut self, ch: char) {
        if self.text.push(ch).is_err() {
            self.overflowed = true;
        }
    }

    /// Text typed so far
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Remove and return the buffered text
    pub fn take(&mut self) -> Line {
        self.overflowed = false;
        mem::take(&mut self.text)
    }

    /// Discard the buffered text
    pub fn clear(&mut self) {
        self.text.clear();
        self.overflowed = false;
    }
}

struct SharedState {
    editor: LineBuffer,
    pending: Option<Line>,
    dropped: u32,
}

/// Line buffer shared between the receive path and the dispatcher
///
/// Appending a byte, detecting the end of line and moving the finished line
/// into the single-slot mailbox happen inside one critical section, so the
/// dispatcher never sees a half-built line.
pub struct SharedLineBuffer {
    state: Mutex<RefCell<SharedState>>,
}

impl fmt::Debug for SharedLineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLineBuffer")
            .field("has_line", &self.has_line())
            .field("dropped", &self.dropped_lines())
            .finish()
    }
}

impl Default for SharedLineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedLineBuffer {
    /// Empty buffer with an empty mailbox
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SharedState {
                editor: LineBuffer::new(),
                pending: None,
                dropped: 0,
            })),
        }
    }

    /// Feed one received byte
    pub fn push(&self, byte: u8) -> LineStatus {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let status = state.editor.push(byte);
            match status {
                LineStatus::Complete if state.pending.is_some() => {
                    state.editor.clear();
                    state.dropped = state.dropped.saturating_add(1);
                    LineStatus::Busy
                }
                LineStatus::Complete => {
                    let line = state.editor.take();
                    state.pending = Some(line);
                    LineStatus::Complete
                }
                LineStatus::Overflowed => {
                    state.dropped = state.dropped.saturating_add(1);
                    status
                }
                _ => status,
            }
        })
    }

    /// Feed several bytes; returns the last non-partial status, if any
    pub fn push_bytes(&self, bytes: &[u8]) -> LineStatus {
        bytes.iter().fold(LineStatus::Partial, |last, byte| match self.push(*byte) {
            LineStatus::Partial => last,
            status => status,
        })
    }

    /// Take the finished line, if one is waiting
    pub fn take_line(&self) -> Option<Line> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).pending.take())
    }

    /// True when a finished line is waiting
    pub fn has_line(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).pending.is_some())
    }

    /// Discard both the partial line and any waiting line
    pub fn clear(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.editor.clear();
            state.pending = None;
        });
    }

    /// Lines lost to overflow or to a full mailbox
    pub fn dropped_lines(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).dropped)
    }
}
