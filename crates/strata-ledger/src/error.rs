use std::fmt;
use std::path::PathBuf;

use strata_types::{EntryId, TagName, TypeError};

/// Where in the ledger document a schema problem was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaPosition {
    /// The document as a whole (syntax errors, wrong top-level types).
    Document,
    /// The `[meta]` block.
    Meta,
    /// The `[applied]` block.
    Applied,
    /// A tag record under `[applied.tags]`.
    Tag(String),
    /// The n-th `[[migrations]]` record, zero based.
    Record(usize),
}

impl fmt::Display for SchemaPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Meta => f.write_str("[meta]"),
            Self::Applied => f.write_str("[applied]"),
            Self::Tag(name) => write!(f, "[applied.tags.{name}]"),
            Self::Record(index) => write!(f, "migrations[{index}]"),
        }
    }
}

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("schema error at {position}: {reason}")]
    Schema {
        position: SchemaPosition,
        reason: String,
    },

    #[error("duplicate entry id: {0}")]
    DuplicateEntry(EntryId),

    /// A commit tried to record a tag the snapshot already holds.
    #[error("tag {tag} is already recorded as produced by {producer}")]
    TagExists { tag: TagName, producer: EntryId },

    #[error("ledger document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(String),
}

impl LedgerError {
    pub(crate) fn schema(position: SchemaPosition, reason: impl Into<String>) -> Self {
        Self::Schema {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn from_type(position: SchemaPosition, err: TypeError) -> Self {
        Self::schema(position, err.to_string())
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
