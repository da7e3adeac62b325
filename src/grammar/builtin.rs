//! Ready-made grammars
//!
//! Numbers accept thousands separators (`1,234,567` or `1234567`).
//!
//! | Grammar | Output | Example |
//! |---------|--------|---------|
//! | [`integer`] | `i64` | `1,234` |
//! | [`float`] | `f64` | `1,234.5` |
//! | [`decimal`] | [`Decimal`] | `1,234.50` |
//! | [`money`] | `f64` | `$1,234.50` |
//! | [`decimal_money`] | [`Decimal`] | `$1,234.50` |
//! | [`hex`] | `i64` | `0x1F`, `\x1f` |
//! | [`binary`] | `i64` | `b1011` |
//! | [`date`] | `NaiveDate` | `2021-03-04`, `03/04/2021` |
//! | [`text`] | `String` | anything |
//! | [`password`] | `String` | anything, echoed as `*` |

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::{ConversionError, DateGrammar, Decimal, Pipeline};

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,3}(,?[0-9]{3})*$").expect("Invalid integer regex"));

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}(,?[0-9]{3})*(\.[0-9]+)?$").expect("Invalid decimal regex")
});

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?[0-9]{1,3}(,?[0-9]{3})*(\.[0-9]+)?$").expect("Invalid money regex")
});

static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|\\)[xX][0-9a-fA-F]+$").expect("Invalid hex regex"));

static BINARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[bB][01]+$").expect("Invalid binary regex"));

static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^.*$").expect("Invalid text regex"));

fn parse_as<T: FromStr>(kind: &'static str) -> impl Fn(&str) -> Result<T, ConversionError> {
    move |s| {
        s.parse::<T>()
            .map_err(|_| ConversionError::new(format!("{} is not a valid {}", s, kind)))
    }
}

fn parse_radix(radix: u32) -> impl Fn(&str) -> Result<i64, ConversionError> {
    move |s| {
        i64::from_str_radix(s, radix)
            .map_err(|_| ConversionError::new(format!("{} does not fit in 64 bits", s)))
    }
}

/// Whole numbers
pub fn integer() -> Pipeline<i64> {
    Pipeline::from_anchored(INT_RE.clone(), parse_as::<i64>("integer")).strip(",")
}

/// Floating point numbers with an optional fraction
pub fn float() -> Pipeline<f64> {
    Pipeline::from_anchored(DECIMAL_RE.clone(), parse_as::<f64>("number")).strip(",")
}

/// Exact decimals with an optional fraction
pub fn decimal() -> Pipeline<Decimal> {
    Pipeline::from_anchored(DECIMAL_RE.clone(), parse_as::<Decimal>("decimal")).strip(",")
}

/// Amounts with an optional leading `$`, as `f64`
pub fn money() -> Pipeline<f64> {
    Pipeline::from_anchored(MONEY_RE.clone(), parse_as::<f64>("amount"))
        .strip("$")
        .strip(",")
}

/// Amounts with an optional leading `$`, kept exact
pub fn decimal_money() -> Pipeline<Decimal> {
    Pipeline::from_anchored(MONEY_RE.clone(), parse_as::<Decimal>("amount"))
        .strip("$")
        .strip(",")
}

/// Hexadecimal with a `0x` or `\x` prefix
pub fn hex() -> Pipeline<i64> {
    Pipeline::from_anchored(HEX_RE.clone(), parse_radix(16))
        .strip("0x")
        .strip("0X")
        .strip("\\x")
        .strip("\\X")
}

/// Binary with a `b` prefix
pub fn binary() -> Pipeline<i64> {
    Pipeline::from_anchored(BINARY_RE.clone(), parse_radix(2))
        .strip("b")
        .strip("B")
}

/// Calendar dates
pub fn date() -> DateGrammar {
    DateGrammar::new()
}

/// Any line, returned as typed
pub fn text() -> Pipeline<String> {
    Pipeline::from_anchored(TEXT_RE.clone(), |s| Ok(s.to_string()))
}

/// Any line, echoed as `*`
pub fn password() -> Pipeline<String> {
    text().with_mask('*')
}
