//! Mutation bodies run as an external program.
//!
//! For every entry the runner is spawned as `<program> <id> <type> <source>`
//! from the project root. It reads a JSON object of the entry's dependency
//! payloads on stdin and writes a JSON object of emitted tags on stdout.
//! Empty output means "emit nothing explicitly"; declared tags then carry
//! `null`. A non-zero exit or malformed output fails the entry.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use strata_sdk::{Entry, EntryId, MigrationContext, MutationFailure, MutationInvoker, Payload, TagName};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct ProcessInvoker {
    program: PathBuf,
    workdir: PathBuf,
}

impl ProcessInvoker {
    pub fn new(program: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
        }
    }
}

#[async_trait]
impl MutationInvoker for ProcessInvoker {
    async fn apply(&self, entry: &Entry, ctx: &mut MigrationContext<'_>) -> Result<(), MutationFailure> {
        let inputs = ctx.dependencies()?;
        let stdin = serde_json::to_vec(&inputs)
            .map_err(|e| MutationFailure::new(format!("cannot encode inputs: {e}")))?;

        let mut child = Command::new(&self.program)
            .arg(entry.id().as_str())
            .arg(entry.kind().as_str())
            .arg(entry.source())
            .current_dir(&self.workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MutationFailure::new(format!("cannot start {}: {e}", self.program.display()))
            })?;
        debug!(entry = %entry.id(), program = %self.program.display(), "runner started");

        let pipe = child.stdin.take();
        let id = entry.id();
        let feed = async move {
            if let Some(mut pipe) = pipe {
                feed_result(id, pipe.write_all(&stdin).await);
            }
        };
        let (_, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| MutationFailure::new(format!("runner i/o: {e}")))?;

        if !output.status.success() {
            return Err(MutationFailure::new(format!("runner exited with {}", output.status)));
        }

        for (name, payload) in parse_emitted(&output.stdout)? {
            ctx.emit(name, payload)?;
        }
        Ok(())
    }
}

/// A runner that ignores stdin may close it early; any other write error is
/// worth a warning, though the exit status still decides the outcome.
fn feed_result(entry: &EntryId, result: io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!(entry = %entry, "runner closed stdin early");
            true
        }
        Err(e) => {
            warn!(entry = %entry, error = %e, "cannot write inputs to runner");
            false
        }
    }
}

/// Decode the runner's stdout into emitted tags.
pub fn parse_emitted(stdout: &[u8]) -> Result<BTreeMap<TagName, Payload>, MutationFailure> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<String, Payload> = serde_json::from_slice(stdout)
        .map_err(|e| MutationFailure::new(format!("runner output is not a JSON object: {e}")))?;
    raw.into_iter()
        .map(|(name, payload)| {
            TagName::new(name)
                .map(|tag| (tag, payload))
                .map_err(|e| MutationFailure::new(format!("runner emitted a bad tag name: {e}")))
        })
        .collect()
}
