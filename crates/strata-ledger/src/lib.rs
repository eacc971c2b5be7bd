//! Append-only migration ledger for strata.
//!
//! This crate owns everything that touches durable storage:
//! - [`Ledger`]: the ordered, append-only collection of entries
//! - [`AppliedRecord`]: which entries have run, in what order, and the tag
//!   snapshot they produced
//! - the TOML ledger document codec ([`document`])
//! - the [`LedgerStore`] trait boundary with a crash-safe file backend and an
//!   in-memory backend for tests and embedding

pub mod applied;
pub mod document;
pub mod error;
pub mod file;
pub mod ledger;
pub mod memory;
pub mod traits;

pub use applied::{AppliedCommit, AppliedRecord, TagRecord};
pub use document::CURRENT_SCHEMA_VERSION;
pub use error::{LedgerError, LedgerResult, SchemaPosition};
pub use file::FileLedgerStore;
pub use ledger::Ledger;
pub use memory::InMemoryLedgerStore;
pub use traits::LedgerStore;
