//! In-memory ledger store for tests and embedding.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::applied::AppliedRecord;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::traits::LedgerStore;

/// A [`LedgerStore`] that keeps the last saved state in memory.
///
/// Counts saves and can be told to fail the next save, which lets tests
/// observe commit boundaries and persistence failures.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<(Ledger, AppliedRecord)>,
    saves: AtomicUsize,
    fail_next_save: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new(ledger: Ledger, applied: AppliedRecord) -> Self {
        Self {
            state: RwLock::new((ledger, applied)),
            saves: AtomicUsize::new(0),
            fail_next_save: AtomicBool::new(false),
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make the next `save` call fail with a store error.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// The currently persisted applied record.
    pub fn applied(&self) -> LedgerResult<AppliedRecord> {
        Ok(self.load()?.1)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self) -> LedgerResult<(Ledger, AppliedRecord)> {
        let state = self
            .state
            .read()
            .map_err(|e| LedgerError::Store(format!("lock poisoned: {e}")))?;
        Ok(state.clone())
    }

    fn save(&self, ledger: &Ledger, applied: &AppliedRecord) -> LedgerResult<()> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Store("injected save failure".into()));
        }
        let mut state = self
            .state
            .write()
            .map_err(|e| LedgerError::Store(format!("lock poisoned: {e}")))?;
        *state = (ledger.clone(), applied.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_is_counted_and_visible() {
        let store = InMemoryLedgerStore::default();
        assert_eq!(store.save_count(), 0);
        store.save(&Ledger::new(), &AppliedRecord::new()).unwrap();
        assert_eq!(store.save_count(), 1);
        assert!(store.load().unwrap().1.is_empty());
    }

    #[test]
    fn injected_failure_only_affects_one_save() {
        let store = InMemoryLedgerStore::default();
        store.fail_next_save();
        assert!(store.save(&Ledger::new(), &AppliedRecord::new()).is_err());
        assert_eq!(store.save_count(), 0);
        assert!(store.save(&Ledger::new(), &AppliedRecord::new()).is_ok());
        assert_eq!(store.save_count(), 1);
    }
}
