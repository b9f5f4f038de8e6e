//! Digital input counts and buffering

/// Number of digital inputs.
pub const NUM_DIGITAL_INPUTS: usize = 24;

/// Maximum digital input name length in bytes.
pub const MAX_DIGITAL_INPUT_NAME_LENGTH: usize = 24;

/// Per-channel digital sample ring capacity.
pub const DIGITAL_INPUT_BUFFER_SIZE: usize = 20;

/// Default digital scan period in milliseconds.
pub const DEFAULT_DIGITAL_PERIOD_MS: u32 = 10;
