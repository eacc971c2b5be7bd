use serde::{Deserialize, Serialize};
use strata_ledger::AppliedRecord;
use strata_types::EntryId;

use crate::error::{ExecError, ExecResult};

/// Per-run state of one pending entry.
///
/// `Applied` is permanent. `Failed` only lasts for the current run; the
/// entry is pending again next time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Pending,
    Applying,
    Applied,
    Failed,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every pending entry was applied.
    Completed,
    /// `entry` failed and the run halted there.
    Failed { entry: EntryId, cause: String },
}

/// What one executor run did.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Entries applied in this run, in order.
    pub applied: Vec<EntryId>,
    /// Final state of every entry that was pending at the start.
    pub states: Vec<(EntryId, EntryState)>,
    pub outcome: RunOutcome,
    /// The applied record as last persisted.
    pub record: AppliedRecord,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }

    /// Nothing was pending.
    pub fn is_noop(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: &EntryId) -> Option<EntryState> {
        self.states
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, state)| *state)
    }

    /// Turn a failed outcome into [`ExecError::Execution`].
    pub fn into_result(self) -> ExecResult<Vec<EntryId>> {
        match self.outcome {
            RunOutcome::Completed => Ok(self.applied),
            RunOutcome::Failed { entry, cause } => Err(ExecError::Execution { entry, cause }),
        }
    }
}
