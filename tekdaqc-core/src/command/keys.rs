//! Argument keys and value scanners

use core::fmt;

/// Key names a command may carry
///
/// Matching is exact and case-sensitive; values keep their case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Channel list or single physical id
    Input,
    /// Sample count
    Number,
    /// Input buffer setting
    Buffer,
    /// Output data rate
    Rate,
    /// PGA gain
    Gain,
    /// Display name
    Name,
    /// Analog input scale
    Scale,
    /// Generic value (calibration factor, serial number)
    Value,
    /// Calibration temperature bin
    Index,
    /// Calibration temperature in Celsius
    Temperature,
}

impl Key {
    /// Wire spelling
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Number => "NUMBER",
            Self::Buffer => "BUFFER",
            Self::Rate => "RATE",
            Self::Gain => "GAIN",
            Self::Name => "NAME",
            Self::Scale => "SCALE",
            Self::Value => "VALUE",
            Self::Index => "INDEX",
            Self::Temperature => "TEMPERATURE",
        }
    }

    /// True when `text` spells this key exactly
    pub fn matches(&self, text: &str) -> bool {
        self.as_str() == text
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leading base-10 digits of `text` as an integer
///
/// Scanning stops at the first non-digit. `None` when there are no leading
/// digits or the value overflows.
pub fn parse_uint(text: &str) -> Option<u32> {
    let end = text
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    text[..end].parse().ok()
}

/// Leading decimal number of `text` as a float
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. Trailing text is ignored; `None` without any digits.
pub fn parse_float(text: &str) -> Option<f32> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    text[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
