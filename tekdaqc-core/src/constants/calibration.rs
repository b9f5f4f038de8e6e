//! Calibration Window, ADC Reference and Persisted Layout
//!
//! Non-volatile storage is addressed in 16-bit words. A 32-bit float is
//! stored as two words (low half at `key`, high half at `key + 1`).

// ===== VALIDITY WINDOW =====

/// Highest board temperature (°C) at which the calibration stays trusted.
///
/// Source: calibration performed between 0 °C and 50 °C
pub const CALIBRATION_VALID_MAX_TEMP: f32 = 50.0;

/// Lowest board temperature (°C) at which the calibration stays trusted.
pub const CALIBRATION_VALID_MIN_TEMP: f32 = 0.0;

// ===== ADC =====

/// ADC reference voltage.
pub const V_REFERENCE: f32 = 2.5;

/// Largest positive 24-bit ADC code.
pub const MAX_CODE: u32 = 8_388_607;

/// LM35 scale: °C per volt.
pub const COLD_JUNCTION_DEG_PER_VOLT: f32 = 100.0;

// ===== TABLE SHAPE =====

/// Number of ADC rate settings.
pub const NUM_SAMPLE_RATES: usize = 16;

/// Number of PGA gain settings.
pub const NUM_PGA_SETTINGS: usize = 7;

/// Number of buffer settings.
pub const NUM_BUFFER_SETTINGS: usize = 2;

/// Number of analog input scales.
pub const NUM_INPUT_RANGES: usize = 2;

/// Temperature bins a calibration run may record.
pub const NUM_CAL_TEMPS: usize = 8;

/// Entries between consecutive temperature bins.
pub const CALIBRATION_TEMP_OFFSET: usize =
    (NUM_INPUT_RANGES + NUM_BUFFER_SETTINGS) * NUM_PGA_SETTINGS * NUM_SAMPLE_RATES;

// ===== STORAGE KEYS =====

/// Board maximum temperature, high half.
pub const ADDR_BOARD_MAX_TEMP_HIGH: u32 = 0x0000;

/// Board maximum temperature, low half.
pub const ADDR_BOARD_MAX_TEMP_LOW: u32 = 0x0001;

/// Board minimum temperature, high half.
pub const ADDR_BOARD_MIN_TEMP_HIGH: u32 = 0x0002;

/// Board minimum temperature, low half.
pub const ADDR_BOARD_MIN_TEMP_LOW: u32 = 0x0003;

/// First word of the board serial number (two ASCII bytes per word).
pub const ADDR_BOARD_SERIAL: u32 = 0x0100;

/// Serial number length in characters.
pub const BOARD_SERIAL_NUM_LENGTH: usize = 32;

/// Calibration valid marker word.
pub const ADDR_CALIBRATION_VALID: u32 = 0x0200;

/// Value of the valid marker once a calibration run is committed.
pub const CALIBRATION_VALID_MARKER: u16 = 0xCA1B;

/// First word of the calibration temperature slots (two words per slot).
pub const ADDR_CALIBRATION_TEMPS: u32 = 0x0210;

/// First word of the gain correction entries (two words per entry).
pub const ADDR_CALIBRATION_DATA: u32 = 0x1000;

/// Pattern of an erased word.
pub const ERASED_WORD: u16 = 0xFFFF;
