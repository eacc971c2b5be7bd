//! End-to-end runs against a ledger document on disk.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use strata_sdk::{
    Entry, EntryId, EntryKind, EntryState, MigrationContext, MutationFailure, MutationInvoker,
    Project, RunOutcome, SdkError, TagName, ViolationKind,
};

const CITY: &str = r#"
[meta]
schema_version = 1

[[migrations]]
id = "0004_trees"
type = "script"
source = "migrations/0004_trees.luau"
depends = ["terrain", "sidewalks"]
emits = ["trees"]

[[migrations]]
id = "0002_terrain"
type = "script"
source = "migrations/0002_terrain.luau"
depends = ["root"]
emits = ["terrain"]

[[migrations]]
id = "0001_origin"
type = "script"
source = "migrations/0001_origin.luau"
emits = ["root"]
description = "Create the place root"

[[migrations]]
id = "0003_sidewalks"
type = "script"
source = "migrations/0003_sidewalks.luau"
depends = ["terrain"]
emits = ["sidewalks"]
"#;

const ORIGIN: &str = "0001_origin";
const TERRAIN: &str = "0002_terrain";
const SIDEWALKS: &str = "0003_sidewalks";
const TREES: &str = "0004_trees";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn id(s: &str) -> EntryId {
    EntryId::new(s).unwrap()
}

fn tag(s: &str) -> TagName {
    TagName::new(s).unwrap()
}

fn ids(list: &[EntryId]) -> Vec<&str> {
    list.iter().map(EntryId::as_str).collect()
}

fn project_with(ledger: &str) -> (tempfile::TempDir, Project) {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), ledger);
    let project = Project::open(dir.path()).unwrap();
    (dir, project)
}

fn write_project(root: &Path, ledger: &str) {
    fs::write(root.join("strata.toml"), "check_assets = false\n").unwrap();
    fs::write(root.join("migrations.toml"), ledger).unwrap();
}

/// Records every call and emits each declared tag with a small payload.
#[derive(Default)]
struct RecordingInvoker {
    calls: Mutex<Vec<EntryId>>,
    fail_on: HashSet<EntryId>,
}

impl RecordingInvoker {
    fn failing(entry: &str) -> Self {
        Self {
            fail_on: [id(entry)].into_iter().collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<EntryId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MutationInvoker for RecordingInvoker {
    async fn apply(&self, entry: &Entry, ctx: &mut MigrationContext<'_>) -> Result<(), MutationFailure> {
        self.calls.lock().unwrap().push(entry.id().clone());
        if self.fail_on.contains(entry.id()) {
            return Err(MutationFailure::new("studio rejected the edit"));
        }
        let inputs = ctx.dependencies()?;
        for name in entry.emits() {
            ctx.emit(name.clone(), json!({ "by": entry.id().as_str(), "inputs": inputs.len() }))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_city_applies_in_dependency_order() {
    let (dir, project) = project_with(CITY);
    let invoker = RecordingInvoker::default();

    assert_eq!(ids(&project.plan().unwrap()), vec![ORIGIN, TERRAIN, SIDEWALKS, TREES]);

    let summary = project.migrate(&invoker).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(ids(&invoker.calls()), vec![ORIGIN, TERRAIN, SIDEWALKS, TREES]);
    assert_eq!(summary.state(&id(TREES)), Some(EntryState::Applied));

    // The document on disk reflects the run.
    let reopened = Project::open(dir.path()).unwrap();
    let status = reopened.status().unwrap();
    assert_eq!(ids(&status.applied), vec![ORIGIN, TERRAIN, SIDEWALKS, TREES]);
    assert!(status.pending.is_empty());
    assert!(status.last_applied_at.is_some());
    assert_eq!(
        status.tags[&tag("trees")].payload,
        json!({ "by": TREES, "inputs": 2 })
    );
}

#[tokio::test]
async fn pre_applied_prefix_leaves_the_rest_pending() {
    let ledger = format!(
        r#"{CITY}
[applied]
last_applied = "{TERRAIN}"
ids = ["{ORIGIN}", "{TERRAIN}"]

[applied.tags.root]
produced_by = "{ORIGIN}"
payload = '{{"seed":42}}'

[applied.tags.terrain]
produced_by = "{TERRAIN}"
payload = 'null'
"#
    );
    let (_dir, project) = project_with(&ledger);

    let status = project.status().unwrap();
    assert_eq!(ids(&status.applied), vec![ORIGIN, TERRAIN]);
    assert_eq!(ids(&status.pending), vec![SIDEWALKS, TREES]);

    let invoker = RecordingInvoker::default();
    let summary = project.migrate(&invoker).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(ids(&invoker.calls()), vec![SIDEWALKS, TREES]);
    assert_eq!(ids(&summary.applied), vec![SIDEWALKS, TREES]);
}

#[tokio::test]
async fn failure_halts_and_the_next_run_retries() {
    let (_dir, project) = project_with(CITY);

    let broken = RecordingInvoker::failing(SIDEWALKS);
    let summary = project.migrate(&broken).await.unwrap();
    assert!(!summary.is_success());
    match &summary.outcome {
        RunOutcome::Failed { entry, cause } => {
            assert_eq!(entry, &id(SIDEWALKS));
            assert!(cause.contains("studio rejected the edit"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(summary.state(&id(SIDEWALKS)), Some(EntryState::Failed));
    assert_eq!(summary.state(&id(TREES)), Some(EntryState::Pending));
    // Nothing after the failing entry was attempted.
    assert_eq!(ids(&broken.calls()), vec![ORIGIN, TERRAIN, SIDEWALKS]);

    let status = project.status().unwrap();
    assert_eq!(ids(&status.applied), vec![ORIGIN, TERRAIN]);
    assert!(!status.tags.contains_key(&tag("sidewalks")));

    let fixed = RecordingInvoker::default();
    let summary = project.migrate(&fixed).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(ids(&fixed.calls()), vec![SIDEWALKS, TREES]);
}

#[tokio::test]
async fn ghost_dependency_blocks_execution() {
    let ledger = format!(
        r#"{CITY}
[[migrations]]
id = "0005_lamps"
type = "script"
source = "migrations/0005_lamps.luau"
depends = ["ghost"]
emits = ["lamps"]
"#
    );
    let (_dir, project) = project_with(&ledger);

    let result = project.validate().unwrap();
    assert_eq!(result.len(), 1);
    let violation = &result.violations[0];
    assert_eq!(violation.kind, ViolationKind::UnresolvedDependency);
    assert_eq!(violation.entry_id, Some(id("0005_lamps")));

    let invoker = RecordingInvoker::default();
    match project.migrate(&invoker).await {
        Err(SdkError::Invalid(result)) => assert_eq!(result.len(), 1),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(invoker.calls().is_empty());
    assert!(project.status().unwrap().applied.is_empty());
}

#[tokio::test]
async fn rerun_after_success_is_a_noop() {
    let (dir, project) = project_with(CITY);
    project.migrate(&RecordingInvoker::default()).await.unwrap();
    let before = fs::read_to_string(dir.path().join("migrations.toml")).unwrap();

    let invoker = RecordingInvoker::default();
    let summary = project.migrate(&invoker).await.unwrap();
    assert!(summary.is_noop());
    assert!(invoker.calls().is_empty());
    assert_eq!(fs::read_to_string(dir.path().join("migrations.toml")).unwrap(), before);
}

#[tokio::test]
async fn appended_entry_runs_on_the_next_migration() {
    let (_dir, project) = project_with(CITY);
    project.migrate(&RecordingInvoker::default()).await.unwrap();

    let cleanup = Entry::builder(id("0005_cleanup"), EntryKind::Remove, "migrations/0005_cleanup.luau")
        .depends([tag("root")])
        .removes([tag("trees")])
        .description("Clear the trees")
        .build();
    project.append(cleanup).unwrap();
    assert_eq!(ids(&project.plan().unwrap()), vec!["0005_cleanup"]);

    let invoker = RecordingInvoker::default();
    project.migrate(&invoker).await.unwrap();
    let status = project.status().unwrap();
    let trees = &status.tags[&tag("trees")];
    assert!(trees.is_removed());
    assert_eq!(trees.removed_by, Some(id("0005_cleanup")));
}

#[tokio::test]
async fn edited_applied_entry_is_refused() {
    let (dir, project) = project_with(CITY);
    project.migrate(&RecordingInvoker::default()).await.unwrap();

    let path = dir.path().join("migrations.toml");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("Create the place root", "Something else")).unwrap();

    match project.status() {
        Err(SdkError::Exec(err)) => assert!(err.to_string().contains(ORIGIN)),
        other => panic!("expected consistency error, got {other:?}"),
    }
}

#[test]
fn missing_ledger_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let project = Project::open(dir.path()).unwrap();
    assert!(matches!(project.status(), Err(SdkError::Ledger(_))));
}
