use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a ledger entry.
///
/// Ids are free-form but usually start with a zero-padded sequence number
/// (`0003_sidewalks`). That number is an ordering *hint*: it breaks ties
/// between entries that become ready at the same time, but the execution
/// order itself always comes from the dependency graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    /// Parse and validate an entry id.
    ///
    /// Valid ids are non-empty and consist of ASCII letters, digits, `_`,
    /// `-` and `.`.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidEntryId {
                id,
                reason: "must not be empty".into(),
            });
        }
        if let Some(ch) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(TypeError::InvalidEntryId {
                reason: format!("contains forbidden character {ch:?}"),
                id,
            });
        }
        Ok(Self(id))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric ordering hint: the first run of ASCII digits in the id.
    ///
    /// Returns `None` when the id has no digits or the run overflows `u64`.
    pub fn ordinal(&self) -> Option<u64> {
        let start = self.0.find(|c: char| c.is_ascii_digit())?;
        let digits: &str = &self.0[start..];
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse().ok()
    }

    /// Compare two ids by ordering hint.
    ///
    /// Numbered ids come first in ascending numeric order (so `9_x` sorts
    /// before `10_y`), ids without a number come after all numbered ones,
    /// and equal hints fall back to lexical order.
    pub fn cmp_by_ordinal(&self, other: &Self) -> Ordering {
        match (self.ordinal(), other.ordinal()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntryId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntryId {
        EntryId::new(s).unwrap()
    }

    #[test]
    fn accepts_conventional_ids() {
        assert!(EntryId::new("0001_origin").is_ok());
        assert!(EntryId::new("terrain-v2.1").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(
            EntryId::new(""),
            Err(TypeError::InvalidEntryId { .. })
        ));
        assert!(EntryId::new("bad id").is_err());
        assert!(EntryId::new("a/b").is_err());
    }

    #[test]
    fn ordinal_reads_first_digit_run() {
        assert_eq!(id("0003_sidewalks").ordinal(), Some(3));
        assert_eq!(id("m12_trees_7").ordinal(), Some(12));
        assert_eq!(id("origin").ordinal(), None);
    }

    #[test]
    fn ordinal_ordering_is_numeric_not_lexical() {
        assert_eq!(id("9_a").cmp_by_ordinal(&id("10_b")), Ordering::Less);
        // Lexically "10_b" < "9_a".
        assert!(id("10_b") < id("9_a"));
    }

    #[test]
    fn unnumbered_ids_sort_last() {
        assert_eq!(id("zeta").cmp_by_ordinal(&id("999_x")), Ordering::Greater);
        assert_eq!(id("alpha").cmp_by_ordinal(&id("beta")), Ordering::Less);
    }

    #[test]
    fn equal_ordinals_fall_back_to_lexical() {
        assert_eq!(id("2_a").cmp_by_ordinal(&id("02_b")), Ordering::Greater);
        assert_eq!(id("2_a").cmp_by_ordinal(&id("2_b")), Ordering::Less);
    }

    #[test]
    fn serde_rejects_invalid_ids() {
        let parsed: Result<EntryId, _> = serde_json::from_str("\"has space\"");
        assert!(parsed.is_err());
        let ok: EntryId = serde_json::from_str("\"0001_origin\"").unwrap();
        assert_eq!(ok.as_str(), "0001_origin");
    }
}
