//! Ledger entries.
//!
//! An [`Entry`] is immutable once built: its fields are private and only
//! getters are exposed. The ledger can append entries but never edit one in
//! place, and the executor fingerprints every entry it applies so that an
//! edit made behind its back is detected on the next run.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::EntryId;
use crate::tag::TagName;

/// Domain tag mixed into every entry fingerprint.
const FINGERPRINT_DOMAIN: &str = "strata-entry-v1";

/// The kind of change an entry performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Runs a migration script against the scene.
    Script,
    /// Places an asset referenced by `source`.
    Asset,
    /// Removes content previously introduced by other entries.
    Remove,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Asset => "asset",
            Self::Remove => "remove",
        }
    }

    /// Whether `removes` is meaningful for this kind.
    pub fn can_remove(&self) -> bool {
        matches!(self, Self::Asset | Self::Remove)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(Self::Script),
            "asset" => Ok(Self::Asset),
            "remove" => Ok(Self::Remove),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

/// One immutable unit of change in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    id: EntryId,
    kind: EntryKind,
    source: String,
    depends: BTreeSet<TagName>,
    emits: BTreeSet<TagName>,
    removes: BTreeSet<TagName>,
    description: String,
}

impl Entry {
    /// Start building an entry.
    pub fn builder(id: EntryId, kind: EntryKind, source: impl Into<String>) -> EntryBuilder {
        EntryBuilder {
            entry: Entry {
                id,
                kind,
                source: source.into(),
                depends: BTreeSet::new(),
                emits: BTreeSet::new(),
                removes: BTreeSet::new(),
                description: String::new(),
            },
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Opaque locator of the migration body or asset, resolved by the host.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn depends(&self) -> &BTreeSet<TagName> {
        &self.depends
    }

    pub fn emits(&self) -> &BTreeSet<TagName> {
        &self.emits
    }

    pub fn removes(&self) -> &BTreeSet<TagName> {
        &self.removes
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// An entry with no dependencies. A valid ledger has exactly one.
    pub fn is_origin(&self) -> bool {
        self.depends.is_empty()
    }

    /// Whether this entry declared `tag` in its `emits`.
    pub fn declares(&self, tag: &TagName) -> bool {
        self.emits.contains(tag)
    }

    /// Content fingerprint: domain-separated BLAKE3 over the canonical JSON
    /// encoding, hex encoded.
    ///
    /// Tag sets are ordered, so the encoding is deterministic.
    pub fn fingerprint(&self) -> Result<String, TypeError> {
        let encoded =
            serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(&encoded);
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }
}

/// Builder for [`Entry`].
///
/// The builder is the only way to assemble an entry; once `build` is called
/// the result cannot be changed.
#[derive(Debug)]
pub struct EntryBuilder {
    entry: Entry,
}

impl EntryBuilder {
    pub fn depends(mut self, tags: impl IntoIterator<Item = TagName>) -> Self {
        self.entry.depends.extend(tags);
        self
    }

    pub fn emits(mut self, tags: impl IntoIterator<Item = TagName>) -> Self {
        self.entry.emits.extend(tags);
        self
    }

    pub fn removes(mut self, tags: impl IntoIterator<Item = TagName>) -> Self {
        self.entry.removes.extend(tags);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = description.into();
        self
    }

    pub fn build(self) -> Entry {
        self.entry
    }
}
