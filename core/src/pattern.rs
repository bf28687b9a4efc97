//! Ordered string predicates used to classify raw counter lines.
//!
//! The exclusion and tracked-name policies are lists of explicit predicates
//! evaluated against the full raw source line, not just the row name. A
//! leading `^` in the textual form selects prefix matching; anything else
//! matches as a substring. Any matching pattern in a list triggers the
//! policy.

use std::fmt;
use std::str::FromStr;

use crate::MonitorError;

/// A single line predicate: substring or prefix match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePattern {
    /// Matches when the line contains the needle anywhere.
    Substring(String),
    /// Matches when the line starts with the needle.
    Prefix(String),
}

impl LinePattern {
    /// Test this predicate against a raw source line.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Substring(needle) => line.contains(needle.as_str()),
            Self::Prefix(needle) => line.starts_with(needle.as_str()),
        }
    }
}

impl FromStr for LinePattern {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "^" {
            return Err(MonitorError::config("empty line pattern"));
        }
        Ok(match s.strip_prefix('^') {
            Some(rest) => Self::Prefix(rest.to_owned()),
            None => Self::Substring(s.to_owned()),
        })
    }
}

impl fmt::Display for LinePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(needle) => write!(f, "{needle}"),
            Self::Prefix(needle) => write!(f, "^{needle}"),
        }
    }
}

/// Test whether any pattern in an ordered list matches the line.
#[must_use]
pub fn any_match(patterns: &[LinePattern], line: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(line))
}
