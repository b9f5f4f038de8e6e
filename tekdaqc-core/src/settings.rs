//! Acquisition settings
//!
//! Typed forms of the ADC's gain, rate and input buffer settings, the
//! analog input scale, and digital logic levels. Each type has a total
//! mapping to its wire string and a parser for command arguments.
//!
//! Parsing is case-insensitive and strict: a token that names no setting is
//! rejected so the caller can report a parse error instead of silently
//! applying a default.

use core::fmt;

/// PGA gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gain {
    /// x1
    #[default]
    X1,
    /// x2
    X2,
    /// x4
    X4,
    /// x8
    X8,
    /// x16
    X16,
    /// x32
    X32,
    /// x64
    X64,
}

impl Gain {
    /// Every gain in table order
    pub const ALL: [Gain; 7] = [
        Gain::X1,
        Gain::X2,
        Gain::X4,
        Gain::X8,
        Gain::X16,
        Gain::X32,
        Gain::X64,
    ];

    /// Amplification factor
    pub const fn multiplier(&self) -> u8 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
            Self::X32 => 32,
            Self::X64 => 64,
        }
    }

    /// Position in calibration tables
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Wire string, e.g. `"x4"`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::X1 => "x1",
            Self::X2 => "x2",
            Self::X4 => "x4",
            Self::X8 => "x8",
            Self::X16 => "x16",
            Self::X32 => "x32",
            Self::X64 => "x64",
        }
    }

    /// Parse `"4"`, `"x4"` or `"X4"`
    pub fn parse(token: &str) -> Option<Self> {
        let digits = token
            .strip_prefix('x')
            .or_else(|| token.strip_prefix('X'))
            .unwrap_or(token);
        let value: u8 = digits.parse().ok()?;
        Self::ALL.iter().copied().find(|g| g.multiplier() == value)
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ADC output data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rate {
    /// 30 000 SPS
    Sps30000,
    /// 15 000 SPS
    Sps15000,
    /// 7 500 SPS
    Sps7500,
    /// 3 750 SPS
    Sps3750,
    /// 2 000 SPS
    Sps2000,
    /// 1 000 SPS
    Sps1000,
    /// 500 SPS
    Sps500,
    /// 100 SPS
    Sps100,
    /// 60 SPS
    #[default]
    Sps60,
    /// 50 SPS
    Sps50,
    /// 30 SPS
    Sps30,
    /// 25 SPS
    Sps25,
    /// 15 SPS
    Sps15,
    /// 10 SPS
    Sps10,
    /// 5 SPS
    Sps5,
    /// 2.5 SPS
    Sps2_5,
}

impl Rate {
    /// Every rate in table order, fastest first
    pub const ALL: [Rate; 16] = [
        Rate::Sps30000,
        Rate::Sps15000,
        Rate::Sps7500,
        Rate::Sps3750,
        Rate::Sps2000,
        Rate::Sps1000,
        Rate::Sps500,
        Rate::Sps100,
        Rate::Sps60,
        Rate::Sps50,
        Rate::Sps30,
        Rate::Sps25,
        Rate::Sps15,
        Rate::Sps10,
        Rate::Sps5,
        Rate::Sps2_5,
    ];

    /// Position in calibration tables
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Wire string, e.g. `"7,500"`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sps30000 => "30,000",
            Self::Sps15000 => "15,000",
            Self::Sps7500 => "7,500",
            Self::Sps3750 => "3,750",
            Self::Sps2000 => "2,000",
            Self::Sps1000 => "1,000",
            Self::Sps500 => "500",
            Self::Sps100 => "100",
            Self::Sps60 => "60",
            Self::Sps50 => "50",
            Self::Sps30 => "30",
            Self::Sps25 => "25",
            Self::Sps15 => "15",
            Self::Sps10 => "10",
            Self::Sps5 => "5",
            Self::Sps2_5 => "2.5",
        }
    }

    /// Samples per second in tenths, exact for every setting
    pub const fn deci_sps(&self) -> u32 {
        match self {
            Self::Sps30000 => 300_000,
            Self::Sps15000 => 150_000,
            Self::Sps7500 => 75_000,
            Self::Sps3750 => 37_500,
            Self::Sps2000 => 20_000,
            Self::Sps1000 => 10_000,
            Self::Sps500 => 5_000,
            Self::Sps100 => 1_000,
            Self::Sps60 => 600,
            Self::Sps50 => 500,
            Self::Sps30 => 300,
            Self::Sps25 => 250,
            Self::Sps15 => 150,
            Self::Sps10 => 100,
            Self::Sps5 => 50,
            Self::Sps2_5 => 25,
        }
    }

    /// Parse `"7500"`, `"7,500"` or `"2.5"`
    pub fn parse(token: &str) -> Option<Self> {
        let mut digits: heapless::String<16> = heapless::String::new();
        for ch in token.chars().filter(|c| *c != ',') {
            digits.push(ch).ok()?;
        }
        Self::ALL.iter().copied().find(|rate| {
            rate.as_str()
                .chars()
                .filter(|c| *c != ',')
                .eq(digits.chars())
        })
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ADC analog input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferSetting {
    /// Buffer bypassed
    #[default]
    Disabled,
    /// Buffer in circuit
    Enabled,
}

impl BufferSetting {
    /// Position in calibration tables
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Wire string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "DISABLED",
            Self::Enabled => "ENABLED",
        }
    }

    /// Parse `ENABLED`/`ON` or `DISABLED`/`OFF`
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("ENABLED") || token.eq_ignore_ascii_case("ON") {
            Some(Self::Enabled)
        } else if token.eq_ignore_ascii_case("DISABLED") || token.eq_ignore_ascii_case("OFF") {
            Some(Self::Disabled)
        } else {
            None
        }
    }
}

impl fmt::Display for BufferSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analog front-end input range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scale {
    /// 0-5 V range
    Analog5V,
    /// 0-400 V range
    #[default]
    Analog400V,
}

impl Scale {
    /// Position in calibration tables
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Token accepted by SET_ANALOG_INPUT_SCALE
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Analog5V => "ANALOG_SCALE_5V",
            Self::Analog400V => "ANALOG_SCALE_400V",
        }
    }

    /// Human readable form
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Analog5V => "ANALOG 0-5V",
            Self::Analog400V => "ANALOG 0-400V",
        }
    }

    /// Parse a scale token, case-insensitively
    pub fn parse(token: &str) -> Option<Self> {
        [Self::Analog5V, Self::Analog400V]
            .into_iter()
            .find(|scale| scale.token().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digital logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Logic low
    #[default]
    Low,
    /// Logic high
    High,
}

impl Level {
    /// `"L"` or `"H"`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "L",
            Self::High => "H",
        }
    }

    /// Level from a port bit
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::High
        } else {
            Self::Low
        }
    }

    /// True for [`Level::High`]
    pub const fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
