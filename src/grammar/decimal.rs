//! Exact decimal numbers
//!
//! `mantissa * 10^-scale`. The scale written by the user is preserved, so
//! `1.50` parses and prints as `1.50`.

use std::fmt;
use std::str::FromStr;

/// An exact base-10 number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

/// Error parsing a [`Decimal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseDecimalError {
    #[error("empty decimal")]
    Empty,
    #[error("invalid character in decimal")]
    InvalidDigit,
    #[error("decimal has too many digits")]
    Overflow,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    pub fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Digits after the decimal point
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// Nearest `f64`
    pub fn to_f64(&self) -> f64 {
        // Going through the string form keeps the rounding exact
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Numeric equality, ignoring trailing zeros (`1.5 == 1.50`)
    pub fn eq_value(&self, other: &Decimal) -> bool {
        let (a, b) = (self.trimmed(), other.trimmed());
        a.mantissa == b.mantissa && a.scale == b.scale
    }

    /// Drop trailing fractional zeros
    pub fn trimmed(&self) -> Decimal {
        let mut d = *self;
        while d.scale > 0 && d.mantissa % 10 == 0 {
            d.mantissa /= 10;
            d.scale -= 1;
        }
        d
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(ParseDecimalError::Empty);
        }

        let mut mantissa: i128 = 0;
        for b in whole.bytes().chain(frac.bytes()) {
            if !b.is_ascii_digit() {
                return Err(ParseDecimalError::InvalidDigit);
            }
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(b - b'0')))
                .ok_or(ParseDecimalError::Overflow)?;
        }

        let scale = u32::try_from(frac.len()).map_err(|_| ParseDecimalError::Overflow)?;
        Ok(Decimal {
            mantissa: if negative { -mantissa } else { mantissa },
            scale,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;

        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }

        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (whole, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, whole, frac)
    }
}
