//! Calendar date grammar
//!
//! Accepts `YYYY-MM-DD` or `MM-DD-YYYY`, with `-` or `/` as the delimiter.
//! Month and day may drop their leading zero. Both delimiters in a date must
//! be the same character.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{Captures, ConversionError, Grammar, ValidationOutcome};

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    const MONTH: &str = "0?[1-9]|1[012]";
    const DAY: &str = "0?[1-9]|[12][0-9]|3[01]";
    let pattern = format!(
        "^(?:\
         (?P<ayear>[0-9]{{4}})(?P<adelim>[-/])(?P<amonth>{m})(?P<adelim2>[-/])(?P<aday>{d})\
         |\
         (?P<bmonth>{m})(?P<bdelim>[-/])(?P<bday>{d})(?P<bdelim2>[-/])(?P<byear>[0-9]{{4}})\
         )$",
        m = MONTH,
        d = DAY
    );
    Regex::new(&pattern).expect("Invalid date regex")
});

/// Grammar producing a [`NaiveDate`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DateGrammar;

impl DateGrammar {
    pub fn new() -> Self {
        Self
    }
}

/// The first group among `names` that matched
fn first<'a>(caps: &'a Captures, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| caps.name(name))
}

impl Grammar for DateGrammar {
    type Output = NaiveDate;

    fn accept(&self, text: &str) -> ValidationOutcome {
        let Some(caps) = DATE_RE.captures(text) else {
            return ValidationOutcome::Rejected;
        };
        let captures = Captures::from_regex(&DATE_RE, &caps);

        let same_delimiter = match (
            first(&captures, &["adelim", "bdelim"]),
            first(&captures, &["adelim2", "bdelim2"]),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };

        if same_delimiter {
            ValidationOutcome::Accepted(captures)
        } else {
            ValidationOutcome::Rejected
        }
    }

    fn convert(&self, captures: &Captures) -> Result<NaiveDate, ConversionError> {
        let field = |names: &[&str]| -> Result<u32, ConversionError> {
            first(captures, names)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| ConversionError::new(format!("{} is not a date", captures.text())))
        };

        let year = field(&["ayear", "byear"])?;
        let month = field(&["amonth", "bmonth"])?;
        let day = field(&["aday", "bday"])?;

        let year = i32::try_from(year)
            .map_err(|_| ConversionError::new(format!("{} is not a date", captures.text())))?;

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ConversionError::new(format!(
                "{} is not a calendar date",
                captures.text()
            ))
        })
    }
}
