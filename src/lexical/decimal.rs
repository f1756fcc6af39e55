//! `decimal` lexical form.
//!
//! The value is kept as canonical digit strings, so any precision survives a
//! round trip. Leading zeros of the integral part and trailing zeros of the
//! fraction are dropped; `-0` becomes `0`.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    /// True for negative values. Never set for zero.
    pub negative: bool,
    /// Integral digits without leading zeros (`"0"` for zero).
    pub integral: String,
    /// Fraction digits without trailing zeros (may be empty).
    pub fractional: String,
}

impl Decimal {
    pub fn is_zero(&self) -> bool {
        self.integral == "0" && self.fractional.is_empty()
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Self {
            negative: v < 0,
            integral: v.unsigned_abs().to_string(),
            fractional: String::new(),
        }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let err = || Error::format("decimal", value);
        let trimmed = value.trim();
        let negative = trimmed.starts_with('-');
        let unsigned = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('+'))
            .unwrap_or(trimmed);

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let integral = int_part.trim_start_matches('0');
        let integral = if integral.is_empty() { "0" } else { integral };
        let fractional = frac_part.trim_end_matches('0');

        let mut d = Decimal {
            negative,
            integral: integral.to_string(),
            fractional: fractional.to_string(),
        };
        // "-0" / "-0.0" → "0"
        if d.is_zero() {
            d.negative = false;
        }
        Ok(d)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.integral)?;
        if !self.fractional.is_empty() {
            write!(f, ".{}", self.fractional)?;
        }
        Ok(())
    }
}
