use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use strata_gate::ValidatedLedger;
use strata_ledger::{AppliedCommit, AppliedRecord, LedgerStore};
use strata_types::{Entry, EntryId, Payload, TagName};
use tracing::{debug, info, warn};

use crate::consistency::verify_applied;
use crate::context::MigrationContext;
use crate::error::{ExecError, ExecResult};
use crate::invoker::{MutationFailure, MutationInvoker};
use crate::registry::TagRegistry;
use crate::summary::{EntryState, RunOutcome, RunSummary};

/// Executor settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Upper bound for a single mutation body. Exceeding it is an ordinary
    /// failure.
    pub entry_timeout: Option<Duration>,
}

/// Applies pending entries one at a time, persisting after each success.
///
/// The executor is the only writer of the applied record. It assumes the
/// caller excludes concurrent runs against the same store.
pub struct Executor<S> {
    store: S,
    config: ExecutorConfig,
}

impl<S: LedgerStore> Executor<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ExecutorConfig::default())
    }

    pub fn with_config(store: S, config: ExecutorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Entries still to apply, in application order.
    ///
    /// Verifies the applied record first; an inconsistent record is an error,
    /// never silently skipped.
    pub fn pending(&self, validated: &ValidatedLedger, applied: &AppliedRecord) -> ExecResult<Vec<EntryId>> {
        verify_applied(validated, applied)?;
        Ok(pending_ids(validated, applied))
    }

    /// Apply every pending entry.
    ///
    /// Returns `Ok` with a [`RunSummary`] both when every entry succeeds and
    /// when one fails (the summary's outcome says which). Errors are reserved
    /// for an inconsistent applied record and for commits that could not be
    /// persisted.
    pub async fn run<I>(
        &self,
        validated: &ValidatedLedger,
        applied: AppliedRecord,
        invoker: &I,
    ) -> ExecResult<RunSummary>
    where
        I: MutationInvoker + ?Sized,
    {
        verify_applied(validated, &applied)?;
        let pending = pending_ids(validated, &applied);
        info!(
            pending = pending.len(),
            applied = applied.len(),
            "starting migration run"
        );

        let mut record = applied;
        let mut registry = TagRegistry::from_record(&record);
        let mut states: Vec<(EntryId, EntryState)> = pending
            .iter()
            .map(|id| (id.clone(), EntryState::Pending))
            .collect();
        let mut applied_now = Vec::new();
        let mut outcome = RunOutcome::Completed;

        for (index, id) in pending.iter().enumerate() {
            let Some(entry) = validated.ledger().get(id) else {
                // The validated ledger produced this id; it cannot be missing.
                continue;
            };

            states[index].1 = EntryState::Applying;
            info!(entry = %id, kind = %entry.kind(), "applying entry");
            let started = Instant::now();

            let result = self.invoke(entry, &registry, invoker).await;
            match result {
                Ok(emitted) => {
                    let commit = AppliedCommit {
                        entry: id.clone(),
                        fingerprint: entry.fingerprint()?,
                        emitted: emitted.clone(),
                        removed: entry.removes().iter().cloned().collect(),
                        at: Utc::now(),
                    };

                    // Stage the registry and a copy of the record; both only
                    // advance once the store has accepted the commit.
                    let staged = stage(&record, &registry, entry, commit, &emitted);
                    let (next, next_registry) = match staged {
                        Ok(staged) => staged,
                        Err(reason) => {
                            states[index].1 = EntryState::Failed;
                            warn!(entry = %id, %reason, "commit refused; halting");
                            return Err(ExecError::Commit {
                                entry: id.clone(),
                                reason,
                            });
                        }
                    };
                    if let Err(source) = self.store.save(validated.ledger(), &next) {
                        states[index].1 = EntryState::Failed;
                        warn!(entry = %id, error = %source, "commit could not be persisted; halting");
                        return Err(ExecError::Persist {
                            entry: id.clone(),
                            source,
                        });
                    }
                    record = next;
                    registry = next_registry;
                    debug!(entry = %id, tags = emitted.len(), "commit persisted");

                    states[index].1 = EntryState::Applied;
                    applied_now.push(id.clone());
                    info!(
                        entry = %id,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "entry applied"
                    );
                }
                Err(failure) => {
                    states[index].1 = EntryState::Failed;
                    warn!(entry = %id, cause = %failure, "entry failed; halting run");
                    outcome = RunOutcome::Failed {
                        entry: id.clone(),
                        cause: failure.message,
                    };
                    break;
                }
            }
        }

        Ok(RunSummary {
            applied: applied_now,
            states,
            outcome,
            record,
        })
    }

    async fn invoke<I>(
        &self,
        entry: &Entry,
        registry: &TagRegistry,
        invoker: &I,
    ) -> Result<BTreeMap<TagName, Payload>, MutationFailure>
    where
        I: MutationInvoker + ?Sized,
    {
        let mut ctx = MigrationContext::new(entry, registry);
        match self.config.entry_timeout {
            Some(limit) => tokio::time::timeout(limit, invoker.apply(entry, &mut ctx))
                .await
                .map_err(|_| MutationFailure::new(format!("timed out after {limit:?}")))??,
            None => invoker.apply(entry, &mut ctx).await?,
        }
        Ok(ctx.into_emitted())
    }
}

/// Apply one commit to copies of the record and the registry.
fn stage(
    record: &AppliedRecord,
    registry: &TagRegistry,
    entry: &Entry,
    commit: AppliedCommit,
    emitted: &BTreeMap<TagName, Payload>,
) -> Result<(AppliedRecord, TagRegistry), String> {
    let mut registry = registry.clone();
    for (name, payload) in emitted {
        registry
            .emit(name.clone(), payload.clone(), entry.id())
            .map_err(|e| e.to_string())?;
    }
    for name in entry.removes() {
        registry.shadow(name, entry.id());
    }

    let mut next = record.clone();
    next.commit(commit).map_err(|e| e.to_string())?;
    Ok((next, registry))
}

fn pending_ids(validated: &ValidatedLedger, applied: &AppliedRecord) -> Vec<EntryId> {
    let done = applied.applied_set();
    validated
        .order()
        .iter()
        .filter(|id| !done.contains(id))
        .cloned()
        .collect()
}
