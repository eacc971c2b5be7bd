//! Incremental executor for strata ledgers.
//!
//! Given a [`ValidatedLedger`](strata_gate::ValidatedLedger) and the
//! persisted [`AppliedRecord`](strata_ledger::AppliedRecord), the
//! [`Executor`] works out which entries are still pending, invokes the
//! host's [`MutationInvoker`] for each one in dependency order, and persists
//! the record after every single success. The first failure halts the run;
//! the failed entry stays pending for the next invocation.
//!
//! Execution is strictly sequential. Mutation bodies may suspend (the trait
//! is async), but two bodies never run at once and a running body is never
//! cancelled except by the optional per-entry timeout, which counts as an
//! ordinary failure.

pub mod consistency;
pub mod context;
pub mod error;
pub mod executor;
pub mod invoker;
pub mod registry;
pub mod summary;

pub use consistency::verify_applied;
pub use context::{MigrationContext, TagView};
pub use error::{ConsistencyError, ExecError, ExecResult, TagError};
pub use executor::{Executor, ExecutorConfig};
pub use invoker::{MutationFailure, MutationInvoker};
pub use registry::TagRegistry;
pub use summary::{EntryState, RunOutcome, RunSummary};
