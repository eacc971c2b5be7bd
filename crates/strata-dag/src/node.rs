//! Graph node and edge types.

use serde::{Deserialize, Serialize};
use strata_types::{EntryId, EntryKind, TagName};

/// Why one entry must run before another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// The consumer lists the tag in `depends`.
    Depends,
    /// The consumer lists the tag in `removes`; whatever it removes must
    /// exist first.
    Removes,
}

/// An incoming edge: `producer` emits `tag`, which the node consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub producer: EntryId,
    pub tag: TagName,
    pub kind: EdgeKind,
}

/// A node in the dependency graph, one per ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: EntryId,
    pub kind: EntryKind,
    /// Declaration position in the ledger.
    pub position: usize,
    /// Incoming edges, one per resolved tag.
    pub parents: Vec<Edge>,
}

impl GraphNode {
    /// Returns `true` if nothing must run before this node.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Distinct producers this node waits on, across all edge kinds.
    pub fn producers(&self) -> impl Iterator<Item = &EntryId> {
        let mut seen: Vec<&EntryId> = Vec::with_capacity(self.parents.len());
        for edge in &self.parents {
            if !seen.contains(&&edge.producer) {
                seen.push(&edge.producer);
            }
        }
        seen.into_iter()
    }

    /// Incoming edges of one kind.
    pub fn parents_by_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.parents.iter().filter(move |e| e.kind == kind)
    }
}
