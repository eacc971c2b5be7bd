//! File-backed ledger store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::applied::AppliedRecord;
use crate::document;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::traits::LedgerStore;

/// A [`LedgerStore`] backed by a single TOML document on disk.
///
/// Saves are atomic: the document is written to a temporary file in the same
/// directory, synced, and then renamed over the target. A crash at any point
/// leaves either the old document or the new one in place.
#[derive(Clone, Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the ledger document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> LedgerResult<(Ledger, AppliedRecord)> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let (ledger, applied) = document::parse(&text)?;
        debug!(
            path = %self.path.display(),
            entries = ledger.len(),
            applied = applied.len(),
            "loaded ledger"
        );
        Ok((ledger, applied))
    }

    fn save(&self, ledger: &Ledger, applied: &AppliedRecord) -> LedgerResult<()> {
        let text = document::render(ledger, applied)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| LedgerError::Io(e.error))?;

        debug!(
            path = %self.path.display(),
            applied = applied.len(),
            "saved ledger"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use strata_types::{Entry, EntryId, EntryKind, TagName};

    use crate::applied::AppliedCommit;

    use super::*;

    fn origin() -> Entry {
        Entry::builder(
            EntryId::new("0001_origin").unwrap(),
            EntryKind::Script,
            "migrations/0001_origin.luau",
        )
        .emits([TagName::new("root").unwrap()])
        .build()
    }

    #[test]
    fn load_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path().join("migrations.toml"));
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path().join("migrations.toml"));

        let mut ledger = Ledger::new();
        ledger.append(origin()).unwrap();
        let mut applied = AppliedRecord::new();
        applied.commit(AppliedCommit {
            entry: EntryId::new("0001_origin").unwrap(),
            fingerprint: origin().fingerprint().unwrap(),
            emitted: [(TagName::new("root").unwrap(), json!({"name": "Workspace"}))]
                .into_iter()
                .collect(),
            removed: vec![],
            at: Utc::now(),
        })
        .unwrap();

        store.save(&ledger, &applied).unwrap();
        let (loaded_ledger, loaded_applied) = store.load().unwrap();
        assert_eq!(loaded_ledger, ledger);
        assert_eq!(loaded_applied.applied_ids(), applied.applied_ids());
        assert_eq!(loaded_applied.tags(), applied.tags());
    }

    #[test]
    fn save_replaces_without_leaving_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path().join("migrations.toml"));

        let mut ledger = Ledger::new();
        store.save(&ledger, &AppliedRecord::new()).unwrap();
        ledger.append(origin()).unwrap();
        store.save(&ledger, &AppliedRecord::new()).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(store.load().unwrap().0.len(), 1);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLedgerStore::new(dir.path().join("place").join("migrations.toml"));
        store.save(&Ledger::new(), &AppliedRecord::new()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn corrupt_document_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrations.toml");
        fs::write(&path, "[[migrations]]\nid = 3\n").unwrap();
        let store = FileLedgerStore::new(&path);
        assert!(matches!(store.load(), Err(LedgerError::Schema { .. })));
    }
}
