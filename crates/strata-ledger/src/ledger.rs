use std::collections::HashMap;

use strata_types::{Entry, EntryId};
use tracing::debug;

use crate::document::CURRENT_SCHEMA_VERSION;
use crate::error::{LedgerError, LedgerResult};

/// The ordered, append-only collection of all entries plus schema metadata.
///
/// Entries keep their append (declaration) order. That order is *not* the
/// execution order, which is derived from the dependency graph. There is no
/// way to edit or remove an entry once appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    schema_version: u32,
    entries: Vec<Entry>,
    index: HashMap<EntryId, usize>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// An empty ledger at the current schema version.
    pub fn new() -> Self {
        Self::with_schema_version(CURRENT_SCHEMA_VERSION)
    }

    pub fn with_schema_version(schema_version: u32) -> Self {
        Self {
            schema_version,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Append an entry. Fails if the id is already taken.
    pub fn append(&mut self, entry: Entry) -> LedgerResult<()> {
        if self.index.contains_key(entry.id()) {
            return Err(LedgerError::DuplicateEntry(entry.id().clone()));
        }
        debug!(entry = %entry.id(), position = self.entries.len(), "appended ledger entry");
        self.index.insert(entry.id().clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.index.contains_key(id)
    }

    /// Declaration position of an entry.
    pub fn position(&self, id: &EntryId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use strata_types::{EntryKind, TagName};

    use super::*;

    fn entry(id: &str) -> Entry {
        Entry::builder(EntryId::new(id).unwrap(), EntryKind::Script, format!("{id}.luau"))
            .emits([TagName::new(id).unwrap()])
            .build()
    }

    #[test]
    fn new_ledger_is_empty_at_current_version() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.schema_version(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn append_preserves_declaration_order() {
        let mut ledger = Ledger::new();
        ledger.append(entry("0003_c")).unwrap();
        ledger.append(entry("0001_a")).unwrap();
        let ids: Vec<&str> = ledger.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["0003_c", "0001_a"]);
        assert_eq!(ledger.position(&EntryId::new("0001_a").unwrap()), Some(1));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut ledger = Ledger::new();
        ledger.append(entry("0001_a")).unwrap();
        let result = ledger.append(entry("0001_a"));
        assert!(matches!(result, Err(LedgerError::DuplicateEntry(_))));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn get_finds_appended_entry() {
        let mut ledger = Ledger::new();
        ledger.append(entry("0001_a")).unwrap();
        let id = EntryId::new("0001_a").unwrap();
        assert_eq!(ledger.get(&id).unwrap().id(), &id);
        assert!(ledger.get(&EntryId::new("0002_b").unwrap()).is_none());
    }
}
