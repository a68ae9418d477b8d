//! Hbar amounts.
//!
//! Stored as a signed count of tinybars (10^-8 ℏ). Fees, transfers and query
//! payments all flow through this type so unit mistakes stay impossible.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Denominations of hbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HbarUnit {
    Tinybar,
    Microbar,
    Millibar,
    Hbar,
    Kilobar,
    Megabar,
    Gigabar,
}

impl HbarUnit {
    /// Tinybars per one of this unit.
    pub const fn tinybars(self) -> i64 {
        match self {
            Self::Tinybar => 1,
            Self::Microbar => 100,
            Self::Millibar => 100_000,
            Self::Hbar => 100_000_000,
            Self::Kilobar => 100_000_000_000,
            Self::Megabar => 100_000_000_000_000,
            Self::Gigabar => 100_000_000_000_000_000,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Tinybar => "tℏ",
            Self::Microbar => "µℏ",
            Self::Millibar => "mℏ",
            Self::Hbar => "ℏ",
            Self::Kilobar => "kℏ",
            Self::Megabar => "Mℏ",
            Self::Gigabar => "Gℏ",
        }
    }
}

impl FromStr for HbarUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "tℏ" => Self::Tinybar,
            "µℏ" => Self::Microbar,
            "mℏ" => Self::Millibar,
            "ℏ" => Self::Hbar,
            "kℏ" => Self::Kilobar,
            "Mℏ" => Self::Megabar,
            "Gℏ" => Self::Gigabar,
            other => return Err(Error::parse(format!("unknown hbar unit `{other}`"))),
        })
    }
}

/// An amount of hbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hbar(i64);

impl Hbar {
    pub const ZERO: Self = Self(0);

    /// Whole hbars.
    pub const fn new(hbars: i64) -> Self {
        Self(hbars.saturating_mul(HbarUnit::Hbar.tinybars()))
    }

    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    pub const fn to_tinybars(self) -> i64 {
        self.0
    }
}

impl Add for Hbar {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Hbar {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Hbar {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl FromStr for Hbar {
    type Err = Error;

    /// `"<decimal> [unit]"`, unit defaulting to ℏ. Amounts that do not land
    /// on a whole tinybar are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::parse(format!("invalid hbar amount `{s}`"));

        let (amount, unit) = match s.split_once(' ') {
            Some((amount, unit)) => (amount, unit.parse::<HbarUnit>()?),
            None => (s, HbarUnit::Hbar),
        };

        let (negative, digits) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let is_digits = |t: &str| t.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) || fraction.len() > 18 {
            return Err(bad());
        }

        let scale = i128::from(unit.tinybars());
        let whole: i128 = whole.parse().map_err(|_| bad())?;
        let mut tinybars = whole.checked_mul(scale).ok_or_else(bad)?;
        if !fraction.is_empty() {
            let denominator = 10i128.pow(fraction.len() as u32);
            let numerator = fraction.parse::<i128>().map_err(|_| bad())? * scale;
            if numerator % denominator != 0 {
                return Err(Error::parse(format!("`{s}` is not a whole number of tinybars")));
            }
            tinybars += numerator / denominator;
        }
        if negative {
            tinybars = -tinybars;
        }
        i64::try_from(tinybars).map(Self).map_err(|_| bad())
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.unsigned_abs() < 10_000 {
            return write!(f, "{} {}", self.0, HbarUnit::Tinybar.symbol());
        }
        let scale = HbarUnit::Hbar.tinybars().unsigned_abs();
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = abs / scale;
        let fraction = abs % scale;
        if fraction == 0 {
            write!(f, "{sign}{whole} ℏ")
        } else {
            let fraction = format!("{fraction:08}");
            write!(f, "{sign}{whole}.{} ℏ", fraction.trim_end_matches('0'))
        }
    }
}
