use std::path::PathBuf;

use strata_types::EntryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    /// The ledger (or a candidate append) failed validation.
    #[error("{0}")]
    Invalid(#[from] strata_gate::ValidationResult),

    #[error("ledger error: {0}")]
    Ledger(#[from] strata_ledger::LedgerError),

    #[error("graph error: {0}")]
    Dag(#[from] strata_dag::DagError),

    #[error("executor error: {0}")]
    Exec(#[from] strata_exec::ExecError),

    #[error(transparent)]
    Types(#[from] strata_types::TypeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
