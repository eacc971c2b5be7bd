use strata_ledger::LedgerError;
use strata_types::{EntryId, TagName, TypeError};

/// Errors from tag resolution and emission.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// No entry has produced this tag (yet).
    #[error("tag not found: {0}")]
    NotFound(TagName),

    /// The tag was produced but a later entry removed it.
    #[error("tag {tag} was removed by {removed_by}")]
    Removed { tag: TagName, removed_by: EntryId },

    /// The tag already exists, from an earlier run or from this one.
    #[error("tag {tag} already emitted by {producer}")]
    DuplicateTag { tag: TagName, producer: EntryId },

    /// The entry tried to emit a tag it did not declare.
    #[error("{entry} emitted {tag}, which it does not declare")]
    Undeclared { entry: EntryId, tag: TagName },
}

/// The applied record does not match the ledger. Never repaired
/// automatically.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("applied entry {0} is not in the ledger")]
    UnknownApplied(EntryId),

    #[error("entry {0} is recorded as applied more than once")]
    DuplicateApplied(EntryId),

    /// An applied entry whose upstream producer was not applied before it.
    #[error("{entry} is applied but {producer} (producer of {tag}) was not applied before it")]
    NotDownwardClosed {
        entry: EntryId,
        producer: EntryId,
        tag: TagName,
    },

    /// A committed entry was edited after it was applied.
    #[error("applied entry {0} was modified after it was applied")]
    EntryModified(EntryId),

    /// The tag snapshot names a producer that is not applied.
    #[error("tag {tag} is attributed to {producer}, which is not applied")]
    UnknownProducer { tag: TagName, producer: EntryId },

    /// The tag snapshot credits a tag to an entry that does not emit it.
    #[error("tag {tag} is attributed to {producer}, which does not declare it")]
    UndeclaredTag { tag: TagName, producer: EntryId },

    /// An applied entry's declared tag is absent from the snapshot.
    #[error("applied entry {entry} declares {tag}, but the snapshot has no record of it")]
    MissingTag { entry: EntryId, tag: TagName },

    /// The snapshot marks a tag removed by something other than an applied
    /// entry that removes it.
    #[error("tag {tag} is marked removed by {remover}, which is not an applied entry removing it")]
    UnexpectedRemoval { tag: TagName, remover: EntryId },
}

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("inconsistent applied record: {0}")]
    Consistency(#[from] ConsistencyError),

    /// A mutation body failed. Produced by
    /// [`RunSummary::into_result`](crate::RunSummary::into_result).
    #[error("migration {entry} failed: {cause}")]
    Execution { entry: EntryId, cause: String },

    /// The commit after a successful entry clashed with the tags already
    /// on record. Nothing was persisted.
    #[error("commit of {entry} was refused: {reason}")]
    Commit { entry: EntryId, reason: String },

    /// The commit after a successful entry could not be persisted.
    #[error("failed to persist commit of {entry}: {source}")]
    Persist {
        entry: EntryId,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Types(#[from] TypeError),
}

/// Convenience alias for executor results.
pub type ExecResult<T> = Result<T, ExecError>;
