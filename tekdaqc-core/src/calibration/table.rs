//! Gain calibration table
//!
//! Correction factors are persisted per (rate, gain, buffer, scale,
//! temperature bin). The table keeps a RAM copy of the factors most
//! recently written or loaded per (rate, gain, buffer) so the sampling path
//! can look one up without touching storage.
//!
//! # Layout
//!
//! ```text
//! offset = bin · 448 + scale · 224 + rate · 14 + gain · 2 + buffer
//! key    = ADDR_CALIBRATION_DATA + 2 · offset      (low word, high word)
//! ```
//!
//! Temperature bins occupy two words each from `ADDR_CALIBRATION_TEMPS`. An
//! all-ones slot is erased.
//!
//! # Calibration mode
//!
//! Entries, bin temperatures and the valid marker can only be written while
//! calibration mode is active. Entering the mode erases the temperatures
//! and the marker, so a session that is abandoned part way leaves the table
//! marked invalid.

use crate::constants::calibration::{
    ADDR_CALIBRATION_DATA, ADDR_CALIBRATION_TEMPS, ADDR_CALIBRATION_VALID,
    CALIBRATION_TEMP_OFFSET, CALIBRATION_VALID_MARKER, ERASED_WORD, NUM_BUFFER_SETTINGS,
    NUM_CAL_TEMPS, NUM_PGA_SETTINGS, NUM_SAMPLE_RATES,
};
use crate::errors::{FunctionError, FunctionResult};
use crate::settings::{BufferSetting, Gain, Rate, Scale};
use crate::traits::NvStore;

use super::encoding::{join_f32, split_f32};

/// Neutral correction factor
pub const NEUTRAL_GAIN: f32 = 1.0;

const ENTRIES_PER_SCALE: usize = NUM_SAMPLE_RATES * NUM_PGA_SETTINGS * NUM_BUFFER_SETTINGS;

type GainCache = [[[f32; NUM_BUFFER_SETTINGS]; NUM_PGA_SETTINGS]; NUM_SAMPLE_RATES];

/// Word offset of a table entry relative to the start of the data region
pub const fn entry_offset(rate: Rate, gain: Gain, buffer: BufferSetting, scale: Scale, bin: usize) -> usize {
    bin * CALIBRATION_TEMP_OFFSET
        + scale.index() * ENTRIES_PER_SCALE
        + rate.index() * NUM_PGA_SETTINGS * NUM_BUFFER_SETTINGS
        + gain.index() * NUM_BUFFER_SETTINGS
        + buffer.index()
}

/// Storage key of the low word of an entry; the high word follows it
pub const fn entry_key(rate: Rate, gain: Gain, buffer: BufferSetting, scale: Scale, bin: usize) -> u32 {
    ADDR_CALIBRATION_DATA + 2 * entry_offset(rate, gain, buffer, scale, bin) as u32
}

/// Storage key of the low word of a bin temperature
pub const fn temperature_key(bin: usize) -> u32 {
    ADDR_CALIBRATION_TEMPS + 2 * bin as u32
}

/// Persisted gain correction factors
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    mode: bool,
    marked_valid: bool,
    scale: Scale,
    temperatures: [Option<f32>; NUM_CAL_TEMPS],
    base_gain: GainCache,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationTable {
    /// Empty table with neutral factors
    pub fn new() -> Self {
        Self {
            mode: false,
            marked_valid: false,
            scale: Scale::default(),
            temperatures: [None; NUM_CAL_TEMPS],
            base_gain: [[[NEUTRAL_GAIN; NUM_BUFFER_SETTINGS]; NUM_PGA_SETTINGS]; NUM_SAMPLE_RATES],
        }
    }

    /// Populate from storage
    ///
    /// The RAM cache is filled from the lowest temperature bin at the
    /// current scale; absent entries stay neutral.
    pub fn load<S: NvStore + ?Sized>(&mut self, store: &S) {
        self.marked_valid = store.read_word(ADDR_CALIBRATION_VALID) == Ok(CALIBRATION_VALID_MARKER);
        for bin in 0..NUM_CAL_TEMPS {
            self.temperatures[bin] = read_slot(store, temperature_key(bin));
        }
        for rate in Rate::ALL {
            for gain in Gain::ALL {
                for buffer in [BufferSetting::Disabled, BufferSetting::Enabled] {
                    let key = entry_key(rate, gain, buffer, self.scale, 0);
                    self.base_gain[rate.index()][gain.index()][buffer.index()] =
                        read_slot(store, key).unwrap_or(NEUTRAL_GAIN);
                }
            }
        }
        log_debug!("calibration table loaded, valid marker {}", self.marked_valid);
    }

    /// Cached factor for the given settings, neutral when none was stored
    pub fn read_entry(&self, rate: Rate, gain: Gain, buffer: BufferSetting) -> f32 {
        self.base_gain[rate.index()][gain.index()][buffer.index()]
    }

    /// Persisted factor for one full key, `None` if absent or erased
    pub fn stored_entry<S: NvStore + ?Sized>(
        &self,
        rate: Rate,
        gain: Gain,
        buffer: BufferSetting,
        scale: Scale,
        bin: usize,
        store: &S,
    ) -> Option<f32> {
        if bin >= NUM_CAL_TEMPS {
            return None;
        }
        read_slot(store, entry_key(rate, gain, buffer, scale, bin))
    }

    /// Persist a correction factor
    #[allow(clippy::too_many_arguments)]
    pub fn write_entry<S: NvStore + ?Sized>(
        &mut self,
        value: f32,
        rate: Rate,
        gain: Gain,
        buffer: BufferSetting,
        scale: Scale,
        bin: usize,
        store: &mut S,
    ) -> FunctionResult<()> {
        if !self.mode {
            log_warn!("calibration entry write outside calibration mode");
            return Err(FunctionError::CalibrationWriteFailed);
        }
        if bin >= NUM_CAL_TEMPS || !value.is_finite() {
            return Err(FunctionError::CalibrationParseError);
        }

        let key = entry_key(rate, gain, buffer, scale, bin);
        write_slot(store, key, value)?;
        self.base_gain[rate.index()][gain.index()][buffer.index()] = value;
        log_debug!("calibration entry {:#06x} = {}", key, value);
        Ok(())
    }

    /// Start a calibration session
    pub fn enter_mode<S: NvStore + ?Sized>(&mut self, store: &mut S) -> FunctionResult<()> {
        let erase = |store: &mut S, key: u32| {
            store.write_word(key, ERASED_WORD).map_err(|_err| {
                log_error!("calibration erase of {:#06x} failed: {:?}", key, _err);
                FunctionError::CalibrationModeFailed
            })
        };
        for bin in 0..NUM_CAL_TEMPS {
            let key = temperature_key(bin);
            erase(store, key)?;
            erase(store, key + 1)?;
        }
        erase(store, ADDR_CALIBRATION_VALID)?;

        self.temperatures = [None; NUM_CAL_TEMPS];
        self.marked_valid = false;
        self.mode = true;
        log_info!("calibration mode entered");
        Ok(())
    }

    /// End the calibration session
    pub fn exit_mode(&mut self) {
        self.mode = false;
        log_info!("calibration mode left");
    }

    /// True during a calibration session
    pub fn in_calibration_mode(&self) -> bool {
        self.mode
    }

    /// Record the temperature of bin `bin`; each bin is written once per session
    pub fn write_temperature<S: NvStore + ?Sized>(
        &mut self,
        temperature: f32,
        bin: usize,
        store: &mut S,
    ) -> FunctionResult<()> {
        if !self.mode {
            return Err(FunctionError::CalibrationWriteFailed);
        }
        if bin >= NUM_CAL_TEMPS || !temperature.is_finite() {
            return Err(FunctionError::CalibrationParseError);
        }
        if self.temperatures[bin].is_some() {
            log_warn!("calibration temperature bin {} already written", bin);
            return Err(FunctionError::CalibrationWriteFailed);
        }
        write_slot(store, temperature_key(bin), temperature)?;
        self.temperatures[bin] = Some(temperature);
        Ok(())
    }

    /// Mark the persisted table valid
    pub fn mark_valid<S: NvStore + ?Sized>(&mut self, store: &mut S) -> FunctionResult<()> {
        if !self.mode {
            return Err(FunctionError::CalibrationWriteFailed);
        }
        store
            .write_word(ADDR_CALIBRATION_VALID, CALIBRATION_VALID_MARKER)
            .map_err(|_| FunctionError::CalibrationWriteFailed)?;
        self.marked_valid = true;
        Ok(())
    }

    /// True once a session ended with the valid marker written
    pub fn is_marked_valid(&self) -> bool {
        self.marked_valid
    }

    /// Bin temperatures, `None` for erased bins
    pub fn temperatures(&self) -> &[Option<f32>; NUM_CAL_TEMPS] {
        &self.temperatures
    }

    /// Input scale used for corrections
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Change the input scale
    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    /// Correction factor for a conversion taken at `temperature`
    ///
    /// Neutral unless the table is marked valid and no session is running.
    /// Between two calibrated bins the factor is interpolated linearly;
    /// outside the calibrated span the nearest bin is used.
    pub fn gain_correction_factor<S: NvStore + ?Sized>(
        &self,
        rate: Rate,
        gain: Gain,
        buffer: BufferSetting,
        temperature: f32,
        store: &S,
    ) -> f32 {
        if !self.marked_valid || self.mode {
            return NEUTRAL_GAIN;
        }

        let mut lower: Option<(usize, f32)> = None;
        let mut upper: Option<(usize, f32)> = None;
        for (bin, slot) in self.temperatures.iter().enumerate() {
            let Some(t) = *slot else { continue };
            if t <= temperature && lower.map_or(true, |(_, best)| t > best) {
                lower = Some((bin, t));
            }
            if t >= temperature && upper.map_or(true, |(_, best)| t < best) {
                upper = Some((bin, t));
            }
        }

        let factor_at = |bin: usize| {
            self.stored_entry(rate, gain, buffer, self.scale, bin, store)
                .unwrap_or(NEUTRAL_GAIN)
        };
        match (lower, upper) {
            (Some((low_bin, low_t)), Some((high_bin, high_t))) => {
                if low_bin == high_bin || high_t <= low_t {
                    return factor_at(low_bin);
                }
                let low_f = factor_at(low_bin);
                let high_f = factor_at(high_bin);
                low_f + (high_f - low_f) * (temperature - low_t) / (high_t - low_t)
            }
            (Some((bin, _)), None) | (None, Some((bin, _))) => factor_at(bin),
            (None, None) => NEUTRAL_GAIN,
        }
    }
}

fn read_slot<S: NvStore + ?Sized>(store: &S, key: u32) -> Option<f32> {
    let low = store.read_word(key).ok()?;
    let high = store.read_word(key + 1).ok()?;
    if low == ERASED_WORD && high == ERASED_WORD {
        return None;
    }
    Some(join_f32(low, high))
}

fn write_slot<S: NvStore + ?Sized>(store: &mut S, key: u32, value: f32) -> FunctionResult<()> {
    let (low, high) = split_f32(value);
    store
        .write_word(key, low)
        .and_then(|()| store.write_word(key + 1, high))
        .map_err(|_err| {
            log_error!("calibration write of {:#06x} failed: {:?}", key, _err);
            FunctionError::CalibrationWriteFailed
        })
}
