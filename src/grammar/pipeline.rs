//! Regex grammar pipeline
//!
//! accept: full match against the pattern
//! convert: strip listed substrings, then cast

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::{Captures, ConversionError, Grammar, ValidationOutcome};

type Cast<T> = Arc<dyn Fn(&str) -> Result<T, ConversionError> + Send + Sync>;

/// Grammar built from a pattern, a strip list and a cast function.
///
/// Every instance owns its configuration; building one grammar from another
/// never changes the original.
pub struct Pipeline<T> {
    regex: Regex,
    strip: Vec<String>,
    cast: Cast<T>,
    mask: Option<char>,
}

impl<T> Pipeline<T> {
    /// Build a pipeline from `pattern`. The pattern must match the whole
    /// line; it is anchored here so callers do not have to.
    pub fn new<F>(pattern: &str, cast: F) -> Result<Self, regex::Error>
    where
        F: Fn(&str) -> Result<T, ConversionError> + Send + Sync + 'static,
    {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self::from_anchored(regex, cast))
    }

    /// Build from a regex that is already anchored at both ends
    pub(crate) fn from_anchored<F>(regex: Regex, cast: F) -> Self
    where
        F: Fn(&str) -> Result<T, ConversionError> + Send + Sync + 'static,
    {
        Self {
            regex,
            strip: Vec::new(),
            cast: Arc::new(cast),
            mask: None,
        }
    }

    /// Remove every occurrence of `text` before casting
    pub fn strip(mut self, text: impl Into<String>) -> Self {
        self.strip.push(text.into());
        self
    }

    /// Echo `mask` instead of the typed text
    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    /// The anchored pattern
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    fn stripped(&self, text: &str) -> String {
        self.strip
            .iter()
            .fold(text.to_string(), |acc, s| acc.replace(s.as_str(), ""))
    }
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            regex: self.regex.clone(),
            strip: self.strip.clone(),
            cast: Arc::clone(&self.cast),
            mask: self.mask,
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("pattern", &self.regex.as_str())
            .field("strip", &self.strip)
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

impl<T> Grammar for Pipeline<T> {
    type Output = T;

    fn accept(&self, text: &str) -> ValidationOutcome {
        match self.regex.captures(text) {
            Some(caps) => ValidationOutcome::Accepted(Captures::from_regex(&self.regex, &caps)),
            None => ValidationOutcome::Rejected,
        }
    }

    fn convert(&self, captures: &Captures) -> Result<T, ConversionError> {
        (self.cast)(&self.stripped(captures.text()))
    }

    fn mask(&self) -> Option<char> {
        self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> Pipeline<String> {
        Pipeline::new("[a-z]+(-[a-z]+)*", |s| Ok(s.to_uppercase())).unwrap()
    }

    #[test]
    fn test_pattern_is_anchored() {
        let grammar = upper();
        assert!(grammar.accept("abc").is_accepted());
        assert!(!grammar.accept("abc1").is_accepted());
        assert!(!grammar.accept("1abc").is_accepted());
        assert_eq!(grammar.pattern(), "^(?:[a-z]+(-[a-z]+)*)$");
    }

    #[test]
    fn test_alternation_anchored_as_a_whole() {
        let grammar = Pipeline::new("a|b", |s| Ok(s.to_string())).unwrap();
        assert!(grammar.accept("a").is_accepted());
        assert!(!grammar.accept("ab").is_accepted());
        assert!(!grammar.accept("xb").is_accepted());
    }

    #[test]
    fn test_strip_then_cast() {
        let grammar = upper().strip("-");
        let ValidationOutcome::Accepted(caps) = grammar.accept("ab-cd") else {
            panic!("rejected");
        };
        assert_eq!(grammar.convert(&caps).unwrap(), "ABCD");
    }

    #[test]
    fn test_derived_grammar_leaves_original_untouched() {
        let base = upper();
        let masked = base.clone().strip("-").with_mask('#');

        assert_eq!(base.mask(), None);
        assert_eq!(masked.mask(), Some('#'));

        let caps = Captures::new("a-b");
        assert_eq!(base.convert(&caps).unwrap(), "A-B");
        assert_eq!(masked.convert(&caps).unwrap(), "AB");
    }

    #[test]
    fn test_cast_error_propagates() {
        let grammar: Pipeline<u8> = Pipeline::new("[0-9]+", |s| {
            s.parse::<u8>()
                .map_err(|_| ConversionError::new(format!("{} does not fit", s)))
        })
        .unwrap();
        let ValidationOutcome::Accepted(caps) = grammar.accept("300") else {
            panic!("rejected");
        };
        assert_eq!(
            grammar.convert(&caps).unwrap_err().message(),
            "300 does not fit"
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Pipeline::new("(", |s| Ok(s.to_string())).is_err());
    }
}
