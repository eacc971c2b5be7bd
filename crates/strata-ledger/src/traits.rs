use crate::applied::AppliedRecord;
use crate::error::LedgerResult;
use crate::ledger::Ledger;

/// Durable storage for the ledger document and its applied record.
///
/// This is the only boundary through which strata touches storage. All
/// implementations must satisfy:
/// - `load` either returns a fully parsed ledger or an error; nothing is
///   partially usable.
/// - `save` is atomic with respect to a crash: a reader sees either the
///   previous document or the new one, never a half-written mix.
/// - Concurrent `load` calls are safe. Concurrent `save` calls are excluded by
///   the caller (single-writer discipline).
pub trait LedgerStore: Send + Sync {
    /// Load and parse the ledger and its applied record.
    fn load(&self) -> LedgerResult<(Ledger, AppliedRecord)>;

    /// Persist the ledger and its applied record.
    fn save(&self, ledger: &Ledger, applied: &AppliedRecord) -> LedgerResult<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn load(&self) -> LedgerResult<(Ledger, AppliedRecord)> {
        (**self).load()
    }

    fn save(&self, ledger: &Ledger, applied: &AppliedRecord) -> LedgerResult<()> {
        (**self).save(ledger, applied)
    }
}
