use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Structured value attached to an emitted tag.
///
/// Payloads are JSON-like (null, bool, number, string, array, object) so
/// they serialize the same way everywhere they are persisted.
pub type Payload = serde_json::Value;

/// Name of a tag: a fact produced by exactly one entry.
///
/// Tag names are free-form apart from a few rules: they must be non-empty
/// and contain no whitespace or control characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Parse and validate a tag name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidTagName {
                name,
                reason: "must not be empty".into(),
            });
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidTagName {
                name,
                reason: "must not contain whitespace or control characters".into(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagName({})", self.0)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TagName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TagName> for String {
    fn from(name: TagName) -> Self {
        name.0
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_and_slashed_names() {
        assert!(TagName::new("terrain").is_ok());
        assert!(TagName::new("sidewalks.v2").is_ok());
        assert!(TagName::new("zone/north").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(TagName::new("").is_err());
        assert!(TagName::new("two words").is_err());
        assert!(TagName::new("tab\there").is_err());
    }

    #[test]
    fn display_is_raw_name() {
        let tag = TagName::new("root").unwrap();
        assert_eq!(tag.to_string(), "root");
    }
}
