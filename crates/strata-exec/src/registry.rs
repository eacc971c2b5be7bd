//! Runtime tag registry.

use std::collections::BTreeMap;

use strata_ledger::{AppliedRecord, TagRecord};
use strata_types::{EntryId, Payload, TagName};
use tracing::debug;

use crate::error::TagError;

/// Maps each tag to the payload that satisfied it and the entry that
/// produced it.
///
/// Seeded from the persisted snapshot at the start of a run and grown after
/// each committed entry. Removed tags stay in the registry as history but no
/// longer resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagRegistry {
    tags: BTreeMap<TagName, TagRecord>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the persisted snapshot.
    pub fn from_record(record: &AppliedRecord) -> Self {
        Self {
            tags: record.tags().clone(),
        }
    }

    /// The payload of a live tag.
    pub fn resolve(&self, name: &TagName) -> Result<&Payload, TagError> {
        match self.tags.get(name) {
            None => Err(TagError::NotFound(name.clone())),
            Some(TagRecord {
                removed_by: Some(by),
                ..
            }) => Err(TagError::Removed {
                tag: name.clone(),
                removed_by: by.clone(),
            }),
            Some(record) => Ok(&record.payload),
        }
    }

    /// Register a new tag. Rejects a name that already exists, removed or
    /// not.
    pub fn emit(&mut self, name: TagName, payload: Payload, producer: &EntryId) -> Result<(), TagError> {
        self.ensure_new(&name)?;
        debug!(tag = %name, producer = %producer, "tag emitted");
        self.tags.insert(name, TagRecord::new(payload, producer.clone()));
        Ok(())
    }

    /// Mark a tag as removed by `by`. Unknown names are ignored.
    pub fn shadow(&mut self, name: &TagName, by: &EntryId) {
        if let Some(record) = self.tags.get_mut(name) {
            debug!(tag = %name, removed_by = %by, "tag shadowed");
            record.removed_by = Some(by.clone());
        }
    }

    pub(crate) fn ensure_new(&self, name: &TagName) -> Result<(), TagError> {
        match self.tags.get(name) {
            Some(existing) => Err(TagError::DuplicateTag {
                tag: name.clone(),
                producer: existing.produced_by.clone(),
            }),
            None => Ok(()),
        }
    }

    /// The full record of a tag, including removed ones.
    pub fn record(&self, name: &TagName) -> Option<&TagRecord> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &TagName) -> bool {
        self.tags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags that still resolve.
    pub fn live(&self) -> impl Iterator<Item = (&TagName, &TagRecord)> {
        self.tags.iter().filter(|(_, record)| !record.is_removed())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use strata_ledger::AppliedCommit;

    use super::*;

    fn tag(s: &str) -> TagName {
        TagName::new(s).unwrap()
    }

    fn id(s: &str) -> EntryId {
        EntryId::new(s).unwrap()
    }

    #[test]
    fn emit_then_resolve() {
        let mut registry = TagRegistry::new();
        registry.emit(tag("root"), json!({"seed": 7}), &id("1_origin")).unwrap();
        assert_eq!(registry.resolve(&tag("root")).unwrap(), &json!({"seed": 7}));
        assert_eq!(registry.record(&tag("root")).unwrap().produced_by, id("1_origin"));
    }

    #[test]
    fn missing_tag_is_not_found() {
        let registry = TagRegistry::new();
        assert_eq!(
            registry.resolve(&tag("ghost")),
            Err(TagError::NotFound(tag("ghost")))
        );
    }

    #[test]
    fn duplicate_emit_is_rejected() {
        let mut registry = TagRegistry::new();
        registry.emit(tag("root"), json!(1), &id("1_origin")).unwrap();
        let err = registry.emit(tag("root"), json!(2), &id("2_other")).unwrap_err();
        assert_eq!(
            err,
            TagError::DuplicateTag {
                tag: tag("root"),
                producer: id("1_origin"),
            }
        );
        assert_eq!(registry.resolve(&tag("root")).unwrap(), &json!(1));
    }

    #[test]
    fn seeded_snapshot_counts_as_existing() {
        let mut record = AppliedRecord::new();
        record.commit(AppliedCommit {
            entry: id("1_origin"),
            fingerprint: "fp".into(),
            emitted: [(tag("root"), json!(null))].into_iter().collect(),
            removed: Vec::new(),
            at: Utc::now(),
        })
        .unwrap();
        let mut registry = TagRegistry::from_record(&record);
        assert_eq!(registry.resolve(&tag("root")).unwrap(), &json!(null));
        assert!(registry.emit(tag("root"), json!(1), &id("2_x")).is_err());
    }

    #[test]
    fn shadowed_tag_no_longer_resolves_but_is_kept() {
        let mut registry = TagRegistry::new();
        registry.emit(tag("props"), json!(["bench"]), &id("2_props")).unwrap();
        registry.shadow(&tag("props"), &id("3_cleanup"));

        assert_eq!(
            registry.resolve(&tag("props")),
            Err(TagError::Removed {
                tag: tag("props"),
                removed_by: id("3_cleanup"),
            })
        );
        assert!(registry.contains(&tag("props")));
        assert_eq!(registry.live().count(), 0);
        // A removed name can never be produced again.
        assert!(registry.emit(tag("props"), json!(1), &id("4_again")).is_err());
    }
}
