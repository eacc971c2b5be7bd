//! High-level SDK for strata.
//!
//! [`Project`] ties a ledger store, the validation engine and the executor
//! together behind one API. This is the main entry point for hosts that embed
//! strata and for the `strata` command line tool.

pub mod assets;
pub mod config;
pub mod error;
pub mod project;

pub use assets::DirectoryAssets;
pub use config::{ProjectConfig, CONFIG_FILE};
pub use error::{SdkError, SdkResult};
pub use project::{EntryReport, EntryStatus, Project, Status};

// Re-export key types
pub use strata_exec::{
    EntryState, MigrationContext, MutationFailure, MutationInvoker, RunOutcome, RunSummary, TagRegistry,
    TagView,
};
pub use strata_gate::{ValidationResult, Violation, ViolationKind};
pub use strata_ledger::{AppliedRecord, Ledger, TagRecord};
pub use strata_types::{Entry, EntryId, EntryKind, Payload, TagName};
