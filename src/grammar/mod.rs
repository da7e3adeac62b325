//! Input grammars
//!
//! A grammar decides whether a finished line is acceptable and turns an
//! accepted line into a typed value. The two steps are separate:
//! [`Grammar::accept`] only looks at the shape of the text, and
//! [`Grammar::convert`] may still fail on text that has the right shape
//! (for example `02/30/2021` looks like a date but is not one).
//!
//! Ready-made grammars live in [`builtin`]; [`Pipeline`] builds new ones from
//! a regular expression, a list of substrings to strip, and a cast function.

pub mod builtin;
mod date;
mod decimal;
mod pipeline;

use std::collections::BTreeMap;

pub use date::DateGrammar;
pub use decimal::{Decimal, ParseDecimalError};
pub use pipeline::Pipeline;

/// Text accepted by a grammar plus any named groups it picked out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    text: String,
    groups: BTreeMap<String, String>,
}

impl Captures {
    /// Captures holding only the whole text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            groups: BTreeMap::new(),
        }
    }

    /// Collect the whole match and every named group that participated
    pub fn from_regex(regex: &regex::Regex, caps: &regex::Captures<'_>) -> Self {
        let text = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let mut captures = Self::new(text);
        for name in regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                captures.groups.insert(name.to_string(), m.as_str().to_string());
            }
        }
        captures
    }

    /// Add a named group
    pub fn with_group(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.groups.insert(name.into(), value.into());
        self
    }

    /// The whole accepted text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// A named group, if it matched
    pub fn name(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(String::as_str)
    }
}

/// Result of checking a line against a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted(Captures),
    Rejected,
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }
}

/// Raised when accepted text cannot be turned into the target type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConversionError {
    message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A validator and converter for one kind of input
pub trait Grammar {
    /// The value produced from an accepted line
    type Output;

    /// Check the whole line. Must not depend on anything but `text`.
    fn accept(&self, text: &str) -> ValidationOutcome;

    /// Turn accepted text into a value
    fn convert(&self, captures: &Captures) -> Result<Self::Output, ConversionError>;

    /// Character to echo instead of the real text, if any
    fn mask(&self) -> Option<char> {
        None
    }
}

impl<G: Grammar + ?Sized> Grammar for &G {
    type Output = G::Output;

    fn accept(&self, text: &str) -> ValidationOutcome {
        (**self).accept(text)
    }

    fn convert(&self, captures: &Captures) -> Result<Self::Output, ConversionError> {
        (**self).convert(captures)
    }

    fn mask(&self) -> Option<char> {
        (**self).mask()
    }
}

impl<G: Grammar + ?Sized> Grammar for Box<G> {
    type Output = G::Output;

    fn accept(&self, text: &str) -> ValidationOutcome {
        (**self).accept(text)
    }

    fn convert(&self, captures: &Captures) -> Result<Self::Output, ConversionError> {
        (**self).convert(captures)
    }

    fn mask(&self) -> Option<char> {
        (**self).mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_from_regex() {
        let re = regex::Regex::new(r"^(?P<whole>[0-9]+)(?:\.(?P<frac>[0-9]+))?$").unwrap();
        let caps = re.captures("12").unwrap();
        let captures = Captures::from_regex(&re, &caps);
        assert_eq!(captures.text(), "12");
        assert_eq!(captures.name("whole"), Some("12"));
        assert_eq!(captures.name("frac"), None);
    }

    #[test]
    fn test_captures_with_group() {
        let captures = Captures::new("x").with_group("k", "v");
        assert_eq!(captures.name("k"), Some("v"));
        assert_eq!(captures.name("missing"), None);
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::new("out of range");
        assert_eq!(err.to_string(), "out of range");
        assert_eq!(err.message(), "out of range");
    }

    #[test]
    fn test_boxed_grammar_delegates() {
        let grammar: Box<dyn Grammar<Output = String>> = Box::new(builtin::password());
        assert_eq!(grammar.mask(), Some('*'));
        let ValidationOutcome::Accepted(caps) = grammar.accept("hunter2") else {
            panic!("password rejected");
        };
        assert_eq!(grammar.convert(&caps).unwrap(), "hunter2");
    }
}
