//! Adaptive throughput governor
//!
//! Slows the sampling cadence when the export consumer cannot keep up and
//! restores it once exports are accepted again. Sampling never blocks on
//! the consumer: the governor only stretches the wait between scans.
//!
//! ## Control law
//!
//! On a penalized failure, with `track` the worst run of consecutive
//! failures seen this episode:
//!
//! ```text
//! window = window_ms · (track + 1)
//! wait   = window − elapsed_since_last_overflow   (window if that is ≤ 0)
//! wait   = wait / buffer_scale · (track + 1) · inputs
//! extra += penalty_gain · wait                    (capped)
//! ```
//!
//! A failure is penalized once per backlog run: the next penalty needs an
//! accepted export in between, or the backlog lasting a whole window. A
//! streak of accepted exports halves the extra wait; when it reaches zero
//! the episode ends.
//!
//! The "slow mode engaged" notice is raised at most once per episode.

use crate::constants::governor::{
    DEFAULT_BUFFER_SCALE, DEFAULT_PENALTY_GAIN, DEFAULT_RECOVERY_STREAK, DEFAULT_WINDOW_MS,
    MAX_EXTRA_WAIT_MS,
};
use crate::time::{elapsed_ms, Timestamp};

/// Text of the one-shot slow mode notice
pub const SLOW_MODE_NOTICE: &str =
    "Network too slow for the requested sampling rate; sampling interval increased.";

/// Governor tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GovernorConfig {
    /// Divisor applied to each penalty
    pub buffer_scale: u8,
    /// Base observation window in milliseconds
    pub window_ms: u64,
    /// Multiplier applied to each penalty
    pub penalty_gain: u64,
    /// Accepted exports in a row that halve the extra wait
    pub recovery_streak: u16,
    /// Ceiling on the extra wait in milliseconds
    pub max_extra_wait_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            buffer_scale: DEFAULT_BUFFER_SCALE,
            window_ms: DEFAULT_WINDOW_MS,
            penalty_gain: DEFAULT_PENALTY_GAIN,
            recovery_streak: DEFAULT_RECOVERY_STREAK,
            max_extra_wait_ms: MAX_EXTRA_WAIT_MS,
        }
    }
}

impl GovernorConfig {
    /// Faster reaction and recovery, for links that stall briefly
    pub fn responsive() -> Self {
        Self {
            window_ms: 2_000,
            recovery_streak: 2,
            ..Self::default()
        }
    }

    /// Set the penalty gain
    pub fn with_penalty_gain(mut self, gain: u64) -> Self {
        self.penalty_gain = gain;
        self
    }

    /// Set the recovery streak, at least one
    pub fn with_recovery_streak(mut self, streak: u16) -> Self {
        self.recovery_streak = streak.max(1);
        self
    }
}

/// Outcome of feeding one export result to the governor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorEvent {
    /// Nothing changed
    Steady,
    /// Export refused, no new penalty
    Backlogged,
    /// Export refused and the wait was stretched
    Degraded {
        /// Extra wait now in force
        extra_wait_ms: u64,
    },
    /// Extra wait reduced but not yet gone
    Easing {
        /// Extra wait now in force
        extra_wait_ms: u64,
    },
    /// Extra wait back to zero
    Recovered,
}

/// Sampling cadence controller driven by export outcomes
#[derive(Debug, Clone)]
pub struct ThroughputGovernor {
    config: GovernorConfig,
    input_count: u8,
    extra_wait_ms: u64,
    consecutive_failures: u16,
    high_water: u16,
    success_streak: u16,
    last_overflow: Option<Timestamp>,
    armed: bool,
    backlog: bool,
    notice_sent: bool,
    notice_pending: bool,
}

impl Default for ThroughputGovernor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

impl ThroughputGovernor {
    /// Governor at nominal rate
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            input_count: 0,
            extra_wait_ms: 0,
            consecutive_failures: 0,
            high_water: 0,
            success_streak: 0,
            last_overflow: None,
            armed: true,
            backlog: false,
            notice_sent: false,
            notice_pending: false,
        }
    }

    /// Tuning in use
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Number of inputs currently being sampled
    pub fn set_input_count(&mut self, count: u8) {
        self.input_count = count;
    }

    /// Feed the result of one export attempt
    pub fn record_export(&mut self, accepted: bool, now: Timestamp) -> GovernorEvent {
        if accepted {
            self.on_accepted()
        } else {
            self.on_refused(now)
        }
    }

    fn on_accepted(&mut self) -> GovernorEvent {
        self.backlog = false;
        self.consecutive_failures = 0;
        self.armed = true;
        if self.extra_wait_ms == 0 {
            return GovernorEvent::Steady;
        }

        self.success_streak = self.success_streak.saturating_add(1);
        if self.success_streak < self.config.recovery_streak.max(1) {
            return GovernorEvent::Steady;
        }
        self.success_streak = 0;
        self.extra_wait_ms /= 2;
        if self.extra_wait_ms > 0 {
            return GovernorEvent::Easing {
                extra_wait_ms: self.extra_wait_ms,
            };
        }

        self.end_episode();
        log_info!("export consumer recovered, sampling back to nominal");
        GovernorEvent::Recovered
    }

    fn on_refused(&mut self, now: Timestamp) -> GovernorEvent {
        self.backlog = true;
        self.success_streak = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.high_water = self.high_water.max(self.consecutive_failures);

        let window = self.window();
        let since_overflow = self.last_overflow.map(|at| elapsed_ms(at, now));
        if !self.armed && since_overflow.map_or(true, |elapsed| elapsed < window) {
            return GovernorEvent::Backlogged;
        }

        let wait = match since_overflow {
            Some(elapsed) if elapsed < window => window - elapsed,
            _ => window,
        };
        let track = u64::from(self.high_water) + 1;
        let inputs = u64::from(self.input_count.max(1));
        let penalty = wait / u64::from(self.config.buffer_scale.max(1)) * track * inputs;
        self.extra_wait_ms = self
            .extra_wait_ms
            .saturating_add(self.config.penalty_gain.saturating_mul(penalty))
            .min(self.config.max_extra_wait_ms);

        self.armed = false;
        self.last_overflow = Some(now);
        if !self.notice_sent {
            self.notice_sent = true;
            self.notice_pending = true;
        }
        log_warn!(
            "export consumer backlogged ({} in a row), extra wait now {} ms",
            self.consecutive_failures,
            self.extra_wait_ms
        );
        GovernorEvent::Degraded {
            extra_wait_ms: self.extra_wait_ms,
        }
    }

    fn window(&self) -> u64 {
        self.config
            .window_ms
            .saturating_mul(u64::from(self.high_water) + 1)
    }

    fn end_episode(&mut self) {
        self.high_water = 0;
        self.last_overflow = None;
        self.notice_sent = false;
        self.notice_pending = false;
    }

    /// Wait to use between scans instead of `nominal_ms`
    pub fn effective_wait(&self, nominal_ms: u64) -> u64 {
        nominal_ms.saturating_add(self.extra_wait_ms)
    }

    /// Extra wait currently added to every scan
    pub fn extra_wait_ms(&self) -> u64 {
        self.extra_wait_ms
    }

    /// True while the cadence is stretched
    pub fn is_degraded(&self) -> bool {
        self.extra_wait_ms > 0
    }

    /// Refused exports since the last accepted one
    pub fn consecutive_failures(&self) -> u16 {
        self.consecutive_failures
    }

    /// Worst refusal run this episode
    pub fn high_water(&self) -> u16 {
        self.high_water
    }

    /// True after a refused export until one is accepted
    pub fn backlog_present(&self) -> bool {
        self.backlog
    }

    /// True when the slow mode notice should go out
    pub fn notice_pending(&self) -> bool {
        self.notice_pending
    }

    /// Mark the slow mode notice delivered
    pub fn notice_delivered(&mut self) {
        self.notice_pending = false;
    }

    /// Back to nominal; buffered samples are not touched
    pub fn reset(&mut self) {
        self.extra_wait_ms = 0;
        self.consecutive_failures = 0;
        self.success_streak = 0;
        self.armed = true;
        self.backlog = false;
        self.end_episode();
        log_debug!("governor reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor() -> ThroughputGovernor {
        let mut governor = ThroughputGovernor::default();
        governor.set_input_count(2);
        governor
    }

    #[test]
    fn first_refusal_applies_full_window_penalty() {
        let mut governor = governor();
        let event = governor.record_export(false, 1_000);
        // window 20_000 / 150 = 133, * track 2 * inputs 2 * gain 3
        assert_eq!(event, GovernorEvent::Degraded { extra_wait_ms: 1596 });
        assert_eq!(governor.effective_wait(10), 1606);
        assert!(governor.backlog_present());
        assert_eq!(governor.high_water(), 1);
    }

    #[test]
    fn refusal_run_is_penalized_once() {
        let mut governor = governor();
        governor.record_export(false, 0);
        let wait = governor.extra_wait_ms();
        assert_eq!(governor.record_export(false, 10), GovernorEvent::Backlogged);
        assert_eq!(governor.record_export(false, 20), GovernorEvent::Backlogged);
        assert_eq!(governor.extra_wait_ms(), wait);
        assert_eq!(governor.high_water(), 3);
    }

    #[test]
    fn persistent_backlog_rearms_after_window() {
        let mut governor = governor();
        governor.record_export(false, 0);
        let first = governor.extra_wait_ms();
        // high water 2 stretches the window to 30 s
        assert_eq!(governor.record_export(false, 10_000), GovernorEvent::Backlogged);
        assert!(matches!(
            governor.record_export(false, 100_000),
            GovernorEvent::Degraded { .. }
        ));
        assert!(governor.extra_wait_ms() > first);
    }

    #[test]
    fn quick_relapse_costs_more_than_slow_one() {
        let mut quick = governor();
        quick.record_export(false, 0);
        quick.record_export(true, 100);
        let before = quick.extra_wait_ms();
        quick.record_export(false, 200);
        let quick_penalty = quick.extra_wait_ms() - before;

        let mut slow = governor();
        slow.record_export(false, 0);
        slow.record_export(true, 100);
        slow.record_export(false, 9_000);
        let slow_penalty = slow.extra_wait_ms() - before;

        assert!(quick_penalty > slow_penalty);
    }

    #[test]
    fn notice_is_raised_once_per_episode() {
        let mut governor = governor();
        governor.record_export(false, 0);
        assert!(governor.notice_pending());
        governor.notice_delivered();

        governor.record_export(true, 10);
        governor.record_export(false, 20);
        assert!(!governor.notice_pending());
    }

    #[test]
    fn success_streak_recovers_and_rearms_notice() {
        let mut governor = ThroughputGovernor::new(GovernorConfig::default().with_recovery_streak(1));
        governor.set_input_count(1);
        governor.record_export(false, 0);
        governor.notice_delivered();

        let mut now = 1;
        let event = loop {
            let event = governor.record_export(true, now);
            if event == GovernorEvent::Recovered {
                break event;
            }
            now += 1;
            assert!(now < 64, "extra wait never drained");
        };
        assert_eq!(event, GovernorEvent::Recovered);
        assert!(!governor.is_degraded());

        governor.record_export(false, now + 1);
        assert!(governor.notice_pending());
    }

    #[test]
    fn extra_wait_is_capped() {
        let mut governor = ThroughputGovernor::new(GovernorConfig::default().with_penalty_gain(1_000));
        governor.set_input_count(24);
        governor.record_export(false, 0);
        assert_eq!(governor.extra_wait_ms(), MAX_EXTRA_WAIT_MS);
    }

    #[test]
    fn reset_restores_nominal() {
        let mut governor = governor();
        governor.record_export(false, 0);
        governor.reset();
        assert_eq!(governor.effective_wait(10), 10);
        assert_eq!(governor.consecutive_failures(), 0);
        assert!(!governor.backlog_present());
        assert!(!governor.notice_pending());
    }
}
