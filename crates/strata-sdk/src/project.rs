use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strata_dag::DependencyGraph;
use strata_exec::{Executor, MutationInvoker, RunSummary};
use strata_gate::{AssetCheck, ValidatedLedger, ValidationEngine, ValidationResult};
use strata_ledger::{AppliedRecord, FileLedgerStore, Ledger, LedgerStore, TagRecord};
use strata_types::{Entry, EntryId, TagName};
use tracing::{debug, info};

use crate::assets::DirectoryAssets;
use crate::config::ProjectConfig;
use crate::error::{SdkError, SdkResult};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Read-only projection of a project's progress.
#[derive(Clone, Debug, Serialize)]
pub struct Status {
    /// Applied entries in execution order.
    pub applied: Vec<EntryId>,
    /// Entries still to apply, in application order. Empty when the ledger
    /// does not validate.
    pub pending: Vec<EntryId>,
    /// Tag snapshot, removed tags included.
    pub tags: BTreeMap<TagName, TagRecord>,
    pub last_applied_at: Option<DateTime<Utc>>,
    pub validation: ValidationResult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Applied,
    Pending,
}

/// One entry together with its place in the graph.
#[derive(Clone, Debug, Serialize)]
pub struct EntryReport {
    pub entry: Entry,
    pub status: EntryStatus,
    /// Producer of each tag the entry waits on (depends and removes).
    /// Unresolved names are missing.
    pub producers: BTreeMap<TagName, EntryId>,
    /// Entries that wait on this one.
    pub dependents: Vec<EntryId>,
    pub fingerprint: String,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A strata project: a ledger store plus the settings around it.
///
/// All operations reload the ledger from the store, so a `Project` never
/// holds stale state between calls.
pub struct Project<S = FileLedgerStore> {
    store: S,
    config: ProjectConfig,
    assets_dir: Option<PathBuf>,
    engine: ValidationEngine,
}

impl Project<FileLedgerStore> {
    /// Open the project rooted at `root`, reading `strata.toml` if present.
    pub fn open(root: impl AsRef<Path>) -> SdkResult<Self> {
        let root = root.as_ref();
        let config = ProjectConfig::load(root)?;
        Ok(Self::open_with_config(root, config))
    }

    /// Open the project rooted at `root` with settings supplied by the
    /// caller. Relative paths in `config` resolve against `root`.
    pub fn open_with_config(root: impl AsRef<Path>, config: ProjectConfig) -> Self {
        let root = root.as_ref();
        let store = FileLedgerStore::new(root.join(&config.ledger));
        let assets_dir = config.check_assets.then(|| root.join(&config.assets));
        debug!(root = %root.display(), ledger = %store.path().display(), "opened project");
        Self {
            store,
            config,
            assets_dir,
            engine: ValidationEngine::with_default_rules(),
        }
    }

    /// Path of the ledger document.
    pub fn ledger_path(&self) -> &Path {
        self.store.path()
    }
}

impl<S: LedgerStore> Project<S> {
    /// A project over any store. `config.assets` is used as given.
    pub fn with_store(store: S, config: ProjectConfig) -> Self {
        let assets_dir = config.check_assets.then(|| config.assets.clone());
        Self {
            store,
            config,
            assets_dir,
            engine: ValidationEngine::with_default_rules(),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Override the per-entry timeout from the config file.
    pub fn set_entry_timeout(&mut self, secs: Option<u64>) {
        self.config.entry_timeout_secs = secs;
    }

    pub fn load(&self) -> SdkResult<(Ledger, AppliedRecord)> {
        Ok(self.store.load()?)
    }

    fn assets(&self) -> Option<DirectoryAssets> {
        self.assets_dir.as_ref().map(DirectoryAssets::new)
    }

    fn validate_ledger(&self, ledger: &Ledger) -> ValidationResult {
        let assets = self.assets();
        self.engine
            .validate(ledger, assets.as_ref().map(|a| a as &dyn AssetCheck))
    }

    fn gate(&self, ledger: &Ledger) -> Result<ValidatedLedger, ValidationResult> {
        let assets = self.assets();
        self.engine
            .gate(ledger, assets.as_ref().map(|a| a as &dyn AssetCheck))
    }

    /// Run every validation rule over the stored ledger.
    pub fn validate(&self) -> SdkResult<ValidationResult> {
        let (ledger, _) = self.load()?;
        Ok(self.validate_ledger(&ledger))
    }

    /// Applied, pending, and tag snapshot.
    ///
    /// An invalid ledger still reports what was applied; pending is left
    /// empty and the violations are attached. An inconsistent applied record
    /// is an error.
    pub fn status(&self) -> SdkResult<Status> {
        let (ledger, applied) = self.load()?;
        let (pending, validation) = match self.gate(&ledger) {
            Ok(validated) => {
                let executor = Executor::new(&self.store);
                (executor.pending(&validated, &applied)?, ValidationResult::default())
            }
            Err(violations) => (Vec::new(), violations),
        };

        Ok(Status {
            applied: applied.applied_ids().to_vec(),
            pending,
            tags: applied.tags().clone(),
            last_applied_at: applied.last_applied_at(),
            validation,
        })
    }

    /// Pending entries in the order `migrate` would apply them.
    pub fn plan(&self) -> SdkResult<Vec<EntryId>> {
        let (ledger, applied) = self.load()?;
        let validated = self.gate(&ledger)?;
        Ok(Executor::new(&self.store).pending(&validated, &applied)?)
    }

    /// Validate, then apply every pending entry through `invoker`.
    ///
    /// A failing entry is reported in the summary, not as an error.
    pub async fn migrate<I>(&self, invoker: &I) -> SdkResult<RunSummary>
    where
        I: MutationInvoker + ?Sized,
    {
        let (ledger, applied) = self.load()?;
        let validated = self.gate(&ledger)?;
        let executor = Executor::with_config(&self.store, self.config.executor_config());
        let summary = executor.run(&validated, applied, invoker).await?;
        info!(
            applied = summary.applied.len(),
            success = summary.is_success(),
            "migration finished"
        );
        Ok(summary)
    }

    /// Append an entry to the ledger.
    ///
    /// The entry is only persisted if it introduces no new violation;
    /// problems that already existed do not block it.
    pub fn append(&self, entry: Entry) -> SdkResult<()> {
        let (mut ledger, applied) = self.load()?;
        let before = self.validate_ledger(&ledger);
        let id = entry.id().clone();
        ledger.append(entry)?;

        let after = self.validate_ledger(&ledger);
        let introduced: Vec<_> = after
            .violations
            .into_iter()
            .filter(|v| !before.violations.contains(v))
            .collect();
        if !introduced.is_empty() {
            return Err(SdkError::Invalid(ValidationResult::new(introduced)));
        }

        self.store.save(&ledger, &applied)?;
        info!(entry = %id, "appended entry");
        Ok(())
    }

    /// Describe one entry.
    pub fn show(&self, id: &EntryId) -> SdkResult<EntryReport> {
        let (ledger, applied) = self.load()?;
        let entry = ledger
            .get(id)
            .ok_or_else(|| SdkError::EntryNotFound(id.clone()))?
            .clone();
        let graph = DependencyGraph::build(&ledger);

        let producers = entry
            .depends()
            .iter()
            .chain(entry.removes())
            .filter_map(|tag| Some((tag.clone(), graph.producer(tag)?.clone())))
            .collect();
        let mut dependents: Vec<EntryId> = graph.dependents(id)?.into_iter().cloned().collect();
        dependents.sort_by(|a, b| a.cmp_by_ordinal(b));

        let status = if applied.is_applied(id) {
            EntryStatus::Applied
        } else {
            EntryStatus::Pending
        };
        let fingerprint = entry.fingerprint()?;

        Ok(EntryReport {
            entry,
            status,
            producers,
            dependents,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use strata_ledger::InMemoryLedgerStore;
    use strata_types::EntryKind;

    use super::*;
    use crate::ViolationKind;

    fn id(s: &str) -> EntryId {
        EntryId::new(s).unwrap()
    }

    fn tag(s: &str) -> TagName {
        TagName::new(s).unwrap()
    }

    fn script(entry_id: &str, depends: &[&str], emits: &[&str]) -> Entry {
        Entry::builder(id(entry_id), EntryKind::Script, format!("{entry_id}.luau"))
            .depends(depends.iter().map(|t| tag(t)))
            .emits(emits.iter().map(|t| tag(t)))
            .build()
    }

    fn project() -> Project<InMemoryLedgerStore> {
        let mut ledger = Ledger::new();
        ledger.append(script("0001_origin", &[], &["root"])).unwrap();
        ledger.append(script("0002_terrain", &["root"], &["terrain"])).unwrap();
        let config = ProjectConfig {
            check_assets: false,
            ..ProjectConfig::default()
        };
        Project::with_store(InMemoryLedgerStore::new(ledger, AppliedRecord::new()), config)
    }

    #[test]
    fn status_of_fresh_project() {
        let status = project().status().unwrap();
        assert!(status.applied.is_empty());
        assert_eq!(status.pending, vec![id("0001_origin"), id("0002_terrain")]);
        assert!(status.validation.is_valid());
    }

    #[test]
    fn append_persists_valid_entry() {
        let project = project();
        project
            .append(script("0003_sidewalks", &["terrain"], &["sidewalks"]))
            .unwrap();
        assert_eq!(project.store().save_count(), 1);
        assert_eq!(project.plan().unwrap().len(), 3);
    }

    #[test]
    fn append_rejects_new_violation() {
        let project = project();
        let err = project
            .append(script("0003_d", &["ghost"], &["d"]))
            .unwrap_err();
        match err {
            SdkError::Invalid(result) => {
                assert_eq!(result.len(), 1);
                assert_eq!(result.violations[0].kind, ViolationKind::UnresolvedDependency);
            }
            other => panic!("expected violations, got {other:?}"),
        }
        assert_eq!(project.store().save_count(), 0);
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let project = project();
        assert!(matches!(
            project.append(script("0002_terrain", &["root"], &["other"])),
            Err(SdkError::Ledger(_))
        ));
    }

    #[test]
    fn show_reports_neighbours() {
        let project = project();
        project
            .append(script("0003_sidewalks", &["terrain"], &["sidewalks"]))
            .unwrap();
        let report = project.show(&id("0002_terrain")).unwrap();
        assert_eq!(report.status, EntryStatus::Pending);
        assert_eq!(report.producers[&tag("root")], id("0001_origin"));
        assert_eq!(report.dependents, vec![id("0003_sidewalks")]);
        assert_eq!(report.fingerprint.len(), 64);

        assert!(matches!(
            project.show(&id("9999_missing")),
            Err(SdkError::EntryNotFound(_))
        ));
    }
}
