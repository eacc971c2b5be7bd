//! Persisted record of applied entries.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_types::{EntryId, Payload, TagName};

use crate::error::{LedgerError, LedgerResult};

/// A tag as it exists in the persisted snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Value the producing entry emitted.
    pub payload: Payload,
    /// Entry that emitted the tag.
    pub produced_by: EntryId,
    /// Entry that later shadowed the tag, if any. The record itself is kept
    /// as history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_by: Option<EntryId>,
}

impl TagRecord {
    pub fn new(payload: Payload, produced_by: EntryId) -> Self {
        Self {
            payload,
            produced_by,
            removed_by: None,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed_by.is_some()
    }
}

/// Everything one successful entry contributes to the [`AppliedRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedCommit {
    pub entry: EntryId,
    pub fingerprint: String,
    pub emitted: BTreeMap<TagName, Payload>,
    pub removed: Vec<TagName>,
    pub at: DateTime<Utc>,
}

/// Which entries have been applied, in actual execution order, plus the tag
/// snapshot they produced.
///
/// The record only grows: entries are appended one commit at a time and
/// nothing is ever taken out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedRecord {
    applied_ids: Vec<EntryId>,
    tags: BTreeMap<TagName, TagRecord>,
    fingerprints: BTreeMap<EntryId, String>,
    last_applied_at: Option<DateTime<Utc>>,
}

impl AppliedRecord {
    /// An empty record: nothing applied yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        applied_ids: Vec<EntryId>,
        tags: BTreeMap<TagName, TagRecord>,
        fingerprints: BTreeMap<EntryId, String>,
        last_applied_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            applied_ids,
            tags,
            fingerprints,
            last_applied_at,
        }
    }

    /// Applied entry ids in execution order.
    pub fn applied_ids(&self) -> &[EntryId] {
        &self.applied_ids
    }

    pub fn applied_set(&self) -> HashSet<&EntryId> {
        self.applied_ids.iter().collect()
    }

    pub fn is_applied(&self, id: &EntryId) -> bool {
        self.applied_ids.contains(id)
    }

    /// The most recently applied entry.
    pub fn last_applied(&self) -> Option<&EntryId> {
        self.applied_ids.last()
    }

    pub fn last_applied_at(&self) -> Option<DateTime<Utc>> {
        self.last_applied_at
    }

    /// The tag snapshot, including shadowed tags.
    pub fn tags(&self) -> &BTreeMap<TagName, TagRecord> {
        &self.tags
    }

    pub fn tag(&self, name: &TagName) -> Option<&TagRecord> {
        self.tags.get(name)
    }

    /// Fingerprint recorded when `id` was applied.
    pub fn fingerprint(&self, id: &EntryId) -> Option<&str> {
        self.fingerprints.get(id).map(String::as_str)
    }

    pub fn fingerprints(&self) -> &BTreeMap<EntryId, String> {
        &self.fingerprints
    }

    pub fn len(&self) -> usize {
        self.applied_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied_ids.is_empty()
    }

    /// Record one successfully applied entry.
    ///
    /// Tags are created exactly once: a commit that emits a name the
    /// snapshot already holds is refused and leaves the record untouched.
    pub fn commit(&mut self, commit: AppliedCommit) -> LedgerResult<()> {
        if let Some((name, existing)) = commit
            .emitted
            .keys()
            .find_map(|name| self.tags.get(name).map(|existing| (name, existing)))
        {
            return Err(LedgerError::TagExists {
                tag: name.clone(),
                producer: existing.produced_by.clone(),
            });
        }

        for (name, payload) in commit.emitted {
            self.tags
                .insert(name, TagRecord::new(payload, commit.entry.clone()));
        }
        for name in commit.removed {
            if let Some(record) = self.tags.get_mut(&name) {
                record.removed_by = Some(commit.entry.clone());
            }
        }
        self.fingerprints
            .insert(commit.entry.clone(), commit.fingerprint);
        self.applied_ids.push(commit.entry);
        self.last_applied_at = Some(commit.at);
        Ok(())
    }
}
