//! What a running migration body can see and do.

use std::collections::BTreeMap;

use strata_types::{Entry, Payload, TagName};

use crate::error::TagError;
use crate::registry::TagRegistry;

/// Read-only view of the tags that existed when an entry started.
#[derive(Clone, Copy, Debug)]
pub struct TagView<'r> {
    registry: &'r TagRegistry,
}

impl<'r> TagView<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, name: &TagName) -> Result<&'r Payload, TagError> {
        self.registry.resolve(name)
    }

    pub fn contains(&self, name: &TagName) -> bool {
        self.registry.resolve(name).is_ok()
    }
}

/// Handed to the mutation body for one entry: a [`TagView`] for reading
/// upstream results and an `emit` function for publishing this entry's own.
///
/// Emissions are staged here and only reach the registry once the entry has
/// succeeded and been committed, so a failed body leaves no trace.
#[derive(Debug)]
pub struct MigrationContext<'r> {
    entry: &'r Entry,
    view: TagView<'r>,
    staged: BTreeMap<TagName, Payload>,
}

impl<'r> MigrationContext<'r> {
    pub fn new(entry: &'r Entry, registry: &'r TagRegistry) -> Self {
        Self {
            entry,
            view: TagView::new(registry),
            staged: BTreeMap::new(),
        }
    }

    /// The entry being applied.
    pub fn entry(&self) -> &'r Entry {
        self.entry
    }

    pub fn tags(&self) -> TagView<'r> {
        self.view
    }

    /// Shorthand for `tags().resolve(name)`.
    pub fn resolve(&self, name: &TagName) -> Result<&'r Payload, TagError> {
        self.view.resolve(name)
    }

    /// Payloads of every tag the entry depends on.
    pub fn dependencies(&self) -> Result<BTreeMap<TagName, Payload>, TagError> {
        self.entry
            .depends()
            .iter()
            .map(|name| Ok((name.clone(), self.view.resolve(name)?.clone())))
            .collect()
    }

    /// Publish a tag. It must be declared in the entry's `emits` and must not
    /// exist yet.
    pub fn emit(&mut self, name: TagName, payload: Payload) -> Result<(), TagError> {
        if !self.entry.declares(&name) {
            return Err(TagError::Undeclared {
                entry: self.entry.id().clone(),
                tag: name,
            });
        }
        self.view.registry.ensure_new(&name)?;
        if self.staged.contains_key(&name) {
            return Err(TagError::DuplicateTag {
                tag: name,
                producer: self.entry.id().clone(),
            });
        }
        self.staged.insert(name, payload);
        Ok(())
    }

    /// Tags emitted so far.
    pub fn staged(&self) -> &BTreeMap<TagName, Payload> {
        &self.staged
    }

    /// Finish the invocation: every declared tag, with `null` for the ones
    /// the body did not emit.
    pub(crate) fn into_emitted(self) -> BTreeMap<TagName, Payload> {
        let mut emitted = self.staged;
        for name in self.entry.emits() {
            emitted.entry(name.clone()).or_insert(Payload::Null);
        }
        emitted
    }
}
