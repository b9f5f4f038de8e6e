//! Throughput Governor Defaults

/// Divisor applied to a penalty; larger values react more gently.
pub const DEFAULT_BUFFER_SCALE: u8 = 150;

/// Base observation window for one backlog episode, in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 10_000;

/// Multiplier applied to each penalty before it is added to the extra wait.
pub const DEFAULT_PENALTY_GAIN: u64 = 3;

/// Consecutive accepted exports that halve the extra wait.
pub const DEFAULT_RECOVERY_STREAK: u16 = 4;

/// Upper bound on the extra wait, in milliseconds.
pub const MAX_EXTRA_WAIT_MS: u64 = 60_000;
