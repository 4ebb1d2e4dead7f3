//! Line codes and line sets.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an empty line code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line code: must not be empty")]
pub struct InvalidLine;

/// A route designation such as `"4"`, `"A"`, `"6X"` or `"JSQ-33"`.
///
/// Ordering is plain lexicographic on the code; this is the tie-break used
/// when sorting arrivals. For rider-facing ordering see
/// [`LineSet::display_order`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineCode(String);

impl LineCode {
    /// Parse a line code, trimming whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidLine> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidLine);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Placeholder for departures the source reports without a line.
    pub fn unknown() -> Self {
        Self("N/A".to_string())
    }

    /// Whether this is the [`LineCode::unknown`] placeholder.
    pub fn is_unknown(&self) -> bool {
        self.0 == "N/A"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sort key for display: numbers by value, then single letters, then
    /// express variants, then everything else.
    fn display_key(&self) -> (u8, u32, &str) {
        let s = self.0.as_str();
        if let Ok(n) = s.parse::<u32>() {
            return (0, n, s);
        }
        if s.chars().count() == 1 {
            return (1, 0, s);
        }
        if is_express_variant(s) {
            return (2, 0, s);
        }
        (3, 0, s)
    }
}

/// `6X`, `7X`, `FX` style express designations plus `SIR`.
fn is_express_variant(s: &str) -> bool {
    if s == "SIR" {
        return true;
    }
    let mut chars = s.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(base), Some('X'), None) if base.is_ascii_alphanumeric()
    )
}

impl TryFrom<String> for LineCode {
    type Error = InvalidLine;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LineCode> for String {
    fn from(line: LineCode) -> Self {
        line.0
    }
}

impl fmt::Debug for LineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineCode({})", self.0)
    }
}

impl fmt::Display for LineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of line codes served at a station, unique per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineSet(BTreeSet<LineCode>);

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a line, returning whether it was new.
    pub fn insert(&mut self, line: LineCode) -> bool {
        self.0.insert(line)
    }

    /// Add every line of `other` to this set.
    pub fn union_with(&mut self, other: &LineSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn contains(&self, line: &LineCode) -> bool {
        self.0.contains(line)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &LineCode> {
        self.0.iter()
    }

    /// Lines in the order riders expect on a board: `1 2 3 A C E 6X SIR ...`.
    pub fn display_order(&self) -> Vec<&LineCode> {
        let mut lines: Vec<&LineCode> = self.0.iter().collect();
        lines.sort_by(|a, b| a.display_key().cmp(&b.display_key()));
        lines
    }
}

impl FromIterator<LineCode> for LineSet {
    fn from_iter<I: IntoIterator<Item = LineCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LineSet {
    type Item = &'a LineCode;
    type IntoIter = std::collections::btree_set::Iter<'a, LineCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
