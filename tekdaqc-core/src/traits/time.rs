//! Time Source Abstraction
//!
//! The board only needs a millisecond counter: sample timestamps, the mux
//! settling deadline and the governor's observation window are all computed
//! from [`TimeSource::now`].
//!
//! ## Example Implementation
//!
//! ```rust
//! use tekdaqc_core::traits::TimeSource;
//! use tekdaqc_core::time::Timestamp;
//!
//! struct SysTick {
//!     ticks: u64,
//! }
//!
//! impl TimeSource for SysTick {
//!     fn now(&self) -> Timestamp {
//!         self.ticks
//!     }
//!
//!     fn is_wall_clock(&self) -> bool {
//!         false
//!     }
//!
//!     fn precision_ms(&self) -> u32 {
//!         1
//!     }
//! }
//! ```

use crate::time::Timestamp;

/// Source of time for the board
pub trait TimeSource {
    /// Current timestamp in milliseconds
    ///
    /// Monotonic sources count from boot; wall clock sources count from the
    /// Unix epoch.
    fn now(&self) -> Timestamp;

    /// Whether this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;

    /// Smallest interval this source can resolve, in milliseconds
    fn precision_ms(&self) -> u32;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }

    fn precision_ms(&self) -> u32 {
        (**self).precision_ms()
    }
}
