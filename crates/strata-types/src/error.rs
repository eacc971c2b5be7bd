use thiserror::Error;

/// Errors produced by type construction and hashing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid entry id {id:?}: {reason}")]
    InvalidEntryId { id: String, reason: String },

    #[error("invalid tag name {name:?}: {reason}")]
    InvalidTagName { name: String, reason: String },

    #[error("unknown entry type: {0:?}")]
    UnknownKind(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
