//! Keyword filter applied to finalized duplication records.

use crate::error::ReportError;
use crate::models::Occurrence;

/// Deduplicated set of path substrings a record must touch.
///
/// A record passes when every pattern is contained in at least one of its
/// paths. An empty set passes everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<String>,
}

impl PatternSet {
    /// Build a set from individual patterns, dropping empties and repeats.
    pub fn new<I, S>(patterns: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for pattern in patterns {
            let pattern = pattern.into();
            if pattern.is_empty() {
                continue;
            }
            if pattern.chars().any(char::is_control) {
                return Err(ReportError::FilterConfig(format!(
                    "{:?} contains control characters",
                    pattern
                )));
            }
            if !set.patterns.contains(&pattern) {
                set.patterns.push(pattern);
            }
        }
        Ok(set)
    }

    /// Parse a `|`-delimited list such as `engine|org`.
    pub fn parse(list: &str) -> Result<Self, ReportError> {
        Self::new(list.split('|'))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The first pattern as supplied, used as the default primary keyword.
    pub fn first(&self) -> Option<&str> {
        self.patterns.first().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }

    /// Decide whether a record survives the filter.
    pub fn matches(&self, occurrence: &Occurrence) -> bool {
        self.patterns
            .iter()
            .all(|pattern| occurrence.first_match(pattern).is_some())
    }
}
