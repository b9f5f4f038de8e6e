//! Board configuration
//!
//! Runtime tuning for the acquisition loop. Defaults come from
//! [`crate::constants`]; a deployment overrides them with the `with_*`
//! builders or one of the presets.
//!
//! ```rust
//! use tekdaqc_core::config::BoardConfig;
//!
//! let config = BoardConfig::default()
//!     .with_mux_settle_ms(500)
//!     .with_export_batch(4);
//! assert_eq!(config.export_batch, 4);
//! ```

use crate::calibration::CalibrationWindow;
use crate::constants::analog::{
    COLD_JUNCTION_READ_INTERVAL, EXTERNAL_MUX_DELAY_MS, SINGLE_ANALOG_WRITE_COUNT,
};
use crate::constants::digital::DEFAULT_DIGITAL_PERIOD_MS;
use crate::governor::GovernorConfig;

/// Acquisition loop configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardConfig {
    /// Settling delay after an external mux switch
    pub mux_settle_ms: u64,
    /// Samples exported per channel per batch, at most
    /// [`SINGLE_ANALOG_WRITE_COUNT`]
    pub export_batch: usize,
    /// Analog conversions between cold junction reads
    pub cold_junction_interval: u32,
    /// Nominal digital scan period
    pub digital_period_ms: u64,
    /// Throughput governor tuning
    pub governor: GovernorConfig,
    /// Temperature range over which the calibration is trusted
    pub calibration_window: CalibrationWindow,
    /// Persist board temperature extremes
    pub track_temperature_extremes: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            mux_settle_ms: EXTERNAL_MUX_DELAY_MS,
            export_batch: SINGLE_ANALOG_WRITE_COUNT,
            cold_junction_interval: COLD_JUNCTION_READ_INTERVAL,
            digital_period_ms: u64::from(DEFAULT_DIGITAL_PERIOD_MS),
            governor: GovernorConfig::default(),
            calibration_window: CalibrationWindow::default(),
            track_temperature_extremes: true,
        }
    }
}

impl BoardConfig {
    /// Short settling and small batches, for links that stall briefly
    pub fn responsive() -> Self {
        Self {
            export_batch: SINGLE_ANALOG_WRITE_COUNT / 2,
            governor: GovernorConfig::responsive(),
            ..Self::default()
        }
    }

    /// No settling delay and no extrema persistence, for bench rigs
    /// with a signal generator wired straight to the inputs
    pub fn bench() -> Self {
        Self {
            mux_settle_ms: 0,
            track_temperature_extremes: false,
            ..Self::default()
        }
    }

    /// Set the external mux settling delay
    pub fn with_mux_settle_ms(mut self, ms: u64) -> Self {
        self.mux_settle_ms = ms;
        self
    }

    /// Set the export batch size, clamped to `1..=SINGLE_ANALOG_WRITE_COUNT`
    pub fn with_export_batch(mut self, batch: usize) -> Self {
        self.export_batch = batch.clamp(1, SINGLE_ANALOG_WRITE_COUNT);
        self
    }

    /// Set the cold junction interleave interval, at least one
    pub fn with_cold_junction_interval(mut self, conversions: u32) -> Self {
        self.cold_junction_interval = conversions.max(1);
        self
    }

    /// Set the nominal digital scan period
    pub fn with_digital_period_ms(mut self, ms: u64) -> Self {
        self.digital_period_ms = ms;
        self
    }

    /// Set the governor tuning
    pub fn with_governor(mut self, governor: GovernorConfig) -> Self {
        self.governor = governor;
        self
    }

    /// Set the calibration temperature window
    pub fn with_calibration_window(mut self, window: CalibrationWindow) -> Self {
        self.calibration_window = window;
        self
    }

    /// Enable or disable persistence of temperature extremes
    pub fn with_temperature_tracking(mut self, enabled: bool) -> Self {
        self.track_temperature_extremes = enabled;
        self
    }

    /// Batch size actually used by the export path
    pub fn effective_batch(&self) -> usize {
        self.export_batch.clamp(1, SINGLE_ANALOG_WRITE_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_board_constants() {
        let config = BoardConfig::default();
        assert_eq!(config.mux_settle_ms, 2000);
        assert_eq!(config.export_batch, 10);
        assert_eq!(config.cold_junction_interval, 333);
        assert!(config.track_temperature_extremes);
        assert_eq!(config.calibration_window.max_celsius(), 50.0);
    }

    #[test]
    fn builders_clamp_their_inputs() {
        let config = BoardConfig::default()
            .with_export_batch(0)
            .with_cold_junction_interval(0);
        assert_eq!(config.export_batch, 1);
        assert_eq!(config.cold_junction_interval, 1);

        let mut raw = BoardConfig::default();
        raw.export_batch = 500;
        assert_eq!(raw.effective_batch(), SINGLE_ANALOG_WRITE_COUNT);
    }

    #[test]
    fn bench_preset_skips_settling() {
        let config = BoardConfig::bench();
        assert_eq!(config.mux_settle_ms, 0);
        assert!(!config.track_temperature_extremes);
    }
}
