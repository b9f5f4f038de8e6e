//! Board temperature monitor
//!
//! The cold junction sensor (an LM35 on the board) doubles as the board
//! temperature sensor. Every cold junction conversion updates the current
//! temperature, and the all-time extremes are persisted so that a board
//! that once left the calibrated temperature range is flagged even after a
//! reset.
//!
//! ```text
//! °C = 100 °C/V · (2 · Vref / gain) · code / full_scale
//! ```

use crate::constants::calibration::{
    ADDR_BOARD_MAX_TEMP_HIGH, ADDR_BOARD_MAX_TEMP_LOW, ADDR_BOARD_MIN_TEMP_HIGH,
    ADDR_BOARD_MIN_TEMP_LOW, CALIBRATION_VALID_MAX_TEMP, CALIBRATION_VALID_MIN_TEMP,
    COLD_JUNCTION_DEG_PER_VOLT, MAX_CODE, V_REFERENCE,
};
use crate::errors::StorageError;
use crate::settings::Gain;
use crate::traits::NvStore;

use super::encoding::{read_f32, write_f32};

/// Temperature range over which the calibration holds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationWindow {
    /// Lowest trusted board temperature in Celsius
    min_celsius: f32,
    /// Highest trusted board temperature in Celsius
    max_celsius: f32,
}

impl Default for CalibrationWindow {
    fn default() -> Self {
        Self {
            min_celsius: CALIBRATION_VALID_MIN_TEMP,
            max_celsius: CALIBRATION_VALID_MAX_TEMP,
        }
    }
}

impl CalibrationWindow {
    /// Window with custom limits; reversed limits are swapped
    pub fn new_with_limits(min: f32, max: f32) -> Self {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        Self {
            min_celsius: min,
            max_celsius: max,
        }
    }

    /// Lowest trusted temperature
    pub fn min_celsius(&self) -> f32 {
        self.min_celsius
    }

    /// Highest trusted temperature
    pub fn max_celsius(&self) -> f32 {
        self.max_celsius
    }

    /// True when recorded extremes never left the window
    ///
    /// Missing history counts as inside the window.
    pub fn holds(&self, max_seen: Option<f32>, min_seen: Option<f32>) -> bool {
        let max_ok = max_seen.map_or(true, |max| max <= self.max_celsius);
        let min_ok = min_seen.map_or(true, |min| min >= self.min_celsius);
        max_ok && min_ok
    }
}

/// Convert a cold junction code taken at `gain` to Celsius
pub fn code_to_celsius(code: i32, gain: Gain) -> f32 {
    // negative full scale is one code larger
    let full_scale = if code < 0 { MAX_CODE + 1 } else { MAX_CODE } as f32;
    let volts_per_fs = (2.0 * V_REFERENCE) / f32::from(gain.multiplier());
    COLD_JUNCTION_DEG_PER_VOLT * volts_per_fs * (code as f32 / full_scale)
}

/// Current board temperature and persisted extremes
#[derive(Debug, Clone)]
pub struct BoardTemperature {
    window: CalibrationWindow,
    track_extremes: bool,
    current: Option<f32>,
    maximum: Option<f32>,
    minimum: Option<f32>,
    loaded: bool,
}

impl BoardTemperature {
    /// Monitor gated by `window`; `track_extremes` enables persistence
    pub fn new(window: CalibrationWindow, track_extremes: bool) -> Self {
        Self {
            window,
            track_extremes,
            current: None,
            maximum: None,
            minimum: None,
            loaded: false,
        }
    }

    /// Read the persisted extremes
    ///
    /// Erased words decode to NaN and count as no record.
    pub fn load<S: NvStore + ?Sized>(&mut self, store: &S) {
        self.maximum = read_extreme(store, ADDR_BOARD_MAX_TEMP_LOW, ADDR_BOARD_MAX_TEMP_HIGH);
        self.minimum = read_extreme(store, ADDR_BOARD_MIN_TEMP_LOW, ADDR_BOARD_MIN_TEMP_HIGH);
        self.loaded = true;
    }

    /// Feed a cold junction conversion; returns the new temperature
    ///
    /// A new extreme is persisted before it is adopted, so a failed write
    /// leaves the recorded extremes unchanged.
    pub fn update<S: NvStore + ?Sized>(
        &mut self,
        code: i32,
        gain: Gain,
        store: &mut S,
    ) -> Result<f32, StorageError> {
        let celsius = code_to_celsius(code, gain);
        self.current = Some(celsius);
        if !self.track_extremes {
            return Ok(celsius);
        }
        if !self.loaded {
            self.load(store);
        }

        if self.maximum.map_or(true, |max| celsius > max) {
            write_f32(store, ADDR_BOARD_MAX_TEMP_LOW, ADDR_BOARD_MAX_TEMP_HIGH, celsius)?;
            self.maximum = Some(celsius);
            log_info!("board temperature maximum now {}", celsius);
        }
        if self.minimum.map_or(true, |min| celsius < min) {
            write_f32(store, ADDR_BOARD_MIN_TEMP_LOW, ADDR_BOARD_MIN_TEMP_HIGH, celsius)?;
            self.minimum = Some(celsius);
            log_info!("board temperature minimum now {}", celsius);
        }
        Ok(celsius)
    }

    /// Latest reading
    pub fn current(&self) -> Option<f32> {
        self.current
    }

    /// Highest recorded temperature
    pub fn maximum(&self) -> Option<f32> {
        self.maximum
    }

    /// Lowest recorded temperature
    pub fn minimum(&self) -> Option<f32> {
        self.minimum
    }

    /// Validity window
    pub fn window(&self) -> &CalibrationWindow {
        &self.window
    }

    /// True unless recorded extremes left the calibration window
    pub fn is_calibration_valid(&self) -> bool {
        self.window.holds(self.maximum, self.minimum)
    }
}

fn read_extreme<S: NvStore + ?Sized>(store: &S, low_key: u32, high_key: u32) -> Option<f32> {
    read_f32(store, low_key, high_key)
        .ok()
        .filter(|celsius| celsius.is_finite())
}

impl Default for BoardTemperature {
    fn default() -> Self {
        Self::new(CalibrationWindow::default(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::calibration::ERASED_WORD;
    use crate::traits::MemoryStore;

    fn code_for(celsius: f32, gain: Gain) -> i32 {
        let volts_per_fs = (2.0 * V_REFERENCE) / f32::from(gain.multiplier());
        libm::roundf(celsius / COLD_JUNCTION_DEG_PER_VOLT / volts_per_fs * MAX_CODE as f32) as i32
    }

    #[test]
    fn conversion_matches_lm35_scale() {
        let full = code_to_celsius(MAX_CODE as i32, Gain::X4);
        assert!((full - 125.0).abs() < 1e-3);
        let quarter = code_to_celsius(code_for(25.0, Gain::X4), Gain::X4);
        assert!((quarter - 25.0).abs() < 0.01);
        assert!(code_to_celsius(-(MAX_CODE as i32) - 1, Gain::X1) < -499.0);
    }

    #[test]
    fn extremes_are_persisted_and_reloaded() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        let mut monitor = BoardTemperature::default();
        monitor.update(code_for(20.0, Gain::X4), Gain::X4, &mut store).unwrap();
        monitor.update(code_for(35.0, Gain::X4), Gain::X4, &mut store).unwrap();
        monitor.update(code_for(10.0, Gain::X4), Gain::X4, &mut store).unwrap();

        let mut restored = BoardTemperature::default();
        restored.load(&store);
        assert!((restored.maximum().unwrap() - 35.0).abs() < 0.01);
        assert!((restored.minimum().unwrap() - 10.0).abs() < 0.01);
        assert!(restored.is_calibration_valid());
    }

    #[test]
    fn erased_extremes_load_as_unrecorded() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        for key in [
            ADDR_BOARD_MAX_TEMP_LOW,
            ADDR_BOARD_MAX_TEMP_HIGH,
            ADDR_BOARD_MIN_TEMP_LOW,
            ADDR_BOARD_MIN_TEMP_HIGH,
        ] {
            store.write_word(key, ERASED_WORD).unwrap();
        }

        let mut monitor = BoardTemperature::default();
        monitor.load(&store);
        assert_eq!(monitor.maximum(), None);
        assert_eq!(monitor.minimum(), None);
        assert!(monitor.is_calibration_valid());

        monitor.update(code_for(25.0, Gain::X4), Gain::X4, &mut store).unwrap();
        assert!((monitor.maximum().unwrap() - 25.0).abs() < 0.01);
        assert!((monitor.minimum().unwrap() - 25.0).abs() < 0.01);
        assert!(monitor.is_calibration_valid());
    }

    #[test]
    fn leaving_window_invalidates_calibration() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        let mut monitor = BoardTemperature::default();
        monitor.update(code_for(55.0, Gain::X4), Gain::X4, &mut store).unwrap();
        assert!(!monitor.is_calibration_valid());

        let mut cold = BoardTemperature::default();
        let mut store: MemoryStore<16> = MemoryStore::new();
        cold.update(code_for(-5.0, Gain::X4), Gain::X4, &mut store).unwrap();
        assert!(!cold.is_calibration_valid());
    }

    #[test]
    fn tracking_can_be_disabled() {
        let mut store: MemoryStore<16> = MemoryStore::new();
        let mut monitor = BoardTemperature::new(CalibrationWindow::default(), false);
        monitor.update(code_for(80.0, Gain::X4), Gain::X4, &mut store).unwrap();
        assert!(monitor.current().is_some());
        assert_eq!(monitor.maximum(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn window_swaps_reversed_limits() {
        let window = CalibrationWindow::new_with_limits(40.0, 10.0);
        assert_eq!(window.min_celsius(), 10.0);
        assert!(window.holds(Some(40.0), Some(10.0)));
        assert!(!window.holds(Some(40.5), None));
        assert!(window.holds(None, None));
    }
}
