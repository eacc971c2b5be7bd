//! The dependency graph structure and its queries.
//!
//! [`DependencyGraph`] stores one [`GraphNode`] per entry plus a forward
//! index (`children`) for dependent queries. Building never stops at the
//! first problem: every duplicate producer and every unresolved name is
//! collected into [`DependencyGraph::issues`] so validation can report the
//! full set in one pass.
//!
//! # Invariants
//!
//! - Each tag maps to at most one producer: the first entry, in declaration
//!   order, that emits it. Later emitters are recorded as duplicates.
//! - Unresolved `depends` names produce no edge.
//! - `removes` names resolve like `depends` and add an ordering edge, except
//!   when an entry removes a tag it emits itself.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use strata_ledger::Ledger;
use strata_types::{EntryId, TagName};
use tracing::debug;

use crate::error::{DagError, DagResult};
use crate::node::{Edge, EdgeKind, GraphNode};

/// Directed graph from tag producers to their consumers.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// All nodes, keyed by entry id.
    nodes: HashMap<EntryId, GraphNode>,
    /// Forward-edge index: producer -> consumers (deduplicated).
    children: HashMap<EntryId, BTreeSet<EntryId>>,
    /// Tag index: name -> producing entry.
    producers: HashMap<TagName, EntryId>,
    /// Entry ids in declaration order.
    declared: Vec<EntryId>,
    /// Problems found while building.
    issues: Vec<DagError>,
}

impl DependencyGraph {
    /// Build the graph for a ledger, collecting every structural issue.
    pub fn build(ledger: &Ledger) -> Self {
        let mut graph = Self::default();

        // Pass 1: tag index.
        for entry in ledger {
            for tag in entry.emits() {
                match graph.producers.get(tag) {
                    Some(first) => graph.issues.push(DagError::DuplicateTag {
                        tag: tag.clone(),
                        first: first.clone(),
                        second: entry.id().clone(),
                    }),
                    None => {
                        graph.producers.insert(tag.clone(), entry.id().clone());
                    }
                }
            }
        }

        // Pass 2: nodes and edges.
        for (position, entry) in ledger.iter().enumerate() {
            let mut parents = Vec::new();

            for tag in entry.depends() {
                match graph.producers.get(tag) {
                    Some(producer) => parents.push(Edge {
                        producer: producer.clone(),
                        tag: tag.clone(),
                        kind: EdgeKind::Depends,
                    }),
                    None => graph.issues.push(DagError::UnresolvedDependency {
                        entry: entry.id().clone(),
                        tag: tag.clone(),
                    }),
                }
            }

            // Unresolved removals are reported by validation, not here.
            for tag in entry.removes() {
                if let Some(producer) = graph.producers.get(tag) {
                    if producer != entry.id() {
                        parents.push(Edge {
                            producer: producer.clone(),
                            tag: tag.clone(),
                            kind: EdgeKind::Removes,
                        });
                    }
                }
            }

            for edge in &parents {
                graph
                    .children
                    .entry(edge.producer.clone())
                    .or_default()
                    .insert(entry.id().clone());
            }

            graph.declared.push(entry.id().clone());
            graph.nodes.insert(
                entry.id().clone(),
                GraphNode {
                    id: entry.id().clone(),
                    kind: entry.kind(),
                    position,
                    parents,
                },
            );
        }

        debug!(
            nodes = graph.nodes.len(),
            tags = graph.producers.len(),
            issues = graph.issues.len(),
            "built dependency graph"
        );
        graph
    }

    /// Build the graph and fail on the first structural issue.
    pub fn try_build(ledger: &Ledger) -> DagResult<Self> {
        let graph = Self::build(ledger);
        match graph.issues.first() {
            Some(issue) => Err(issue.clone()),
            None => Ok(graph),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &EntryId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.declared.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Duplicate producers and unresolved dependencies found while building.
    pub fn issues(&self) -> &[DagError] {
        &self.issues
    }

    /// The entry that emits `tag`.
    pub fn producer(&self, tag: &TagName) -> Option<&EntryId> {
        self.producers.get(tag)
    }

    /// Entries that must run directly before `id`.
    pub fn dependencies(&self, id: &EntryId) -> DagResult<BTreeSet<&EntryId>> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DagError::UnknownEntry(id.clone()))?;
        Ok(node.producers().collect())
    }

    /// Entries that consume something `id` emits.
    pub fn dependents(&self, id: &EntryId) -> DagResult<BTreeSet<&EntryId>> {
        if !self.nodes.contains_key(id) {
            return Err(DagError::UnknownEntry(id.clone()));
        }
        Ok(self
            .children
            .get(id)
            .map(|set| set.iter().collect())
            .unwrap_or_default())
    }

    // ---------------------------------------------------------------
    // Transitive queries
    // ---------------------------------------------------------------

    /// Every entry `id` transitively waits on (BFS upward). The entry itself
    /// is not included.
    pub fn ancestors(&self, id: &EntryId) -> HashSet<EntryId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&EntryId> = VecDeque::new();
        if let Some(node) = self.nodes.get(id) {
            queue.extend(node.producers());
        }

        while let Some(current) = queue.pop_front() {
            if current == id || !visited.insert(current.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                queue.extend(node.producers());
            }
        }

        visited
    }

    /// Every entry that transitively waits on `id` (BFS downward), following
    /// only edges of the given kinds. The entry itself is not included.
    pub fn descendants(&self, id: &EntryId, kinds: &[EdgeKind]) -> HashSet<EntryId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&EntryId> = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            let Some(children) = self.children.get(current) else {
                continue;
            };
            for child in children {
                if child == id || visited.contains(child) {
                    continue;
                }
                let linked = self.nodes.get(child).is_some_and(|node| {
                    node.parents
                        .iter()
                        .any(|e| &e.producer == current && kinds.contains(&e.kind))
                });
                if linked {
                    visited.insert(child.clone());
                    queue.push_back(child);
                }
            }
        }

        visited
    }

    pub(crate) fn children_of(&self, id: &EntryId) -> impl Iterator<Item = &EntryId> {
        self.children.get(id).into_iter().flatten()
    }

    pub(crate) fn declared(&self) -> &[EntryId] {
        &self.declared
    }
}

#[cfg(test)]
mod tests {
    use strata_types::{Entry, EntryKind};

    use super::*;

    fn id(s: &str) -> EntryId {
        EntryId::new(s).unwrap()
    }

    fn tags(names: &[&str]) -> Vec<TagName> {
        names.iter().map(|n| TagName::new(*n).unwrap()).collect()
    }

    fn script(entry_id: &str, depends: &[&str], emits: &[&str]) -> Entry {
        Entry::builder(id(entry_id), EntryKind::Script, format!("{entry_id}.luau"))
            .depends(tags(depends))
            .emits(tags(emits))
            .build()
    }

    fn ledger(entries: Vec<Entry>) -> Ledger {
        let mut ledger = Ledger::new();
        for entry in entries {
            ledger.append(entry).unwrap();
        }
        ledger
    }

    /// origin -> A -> B, and C depends on both A and B.
    fn city() -> Ledger {
        ledger(vec![
            script("0001_origin", &[], &["root"]),
            script("0002_terrain", &["root"], &["terrain"]),
            script("0003_sidewalks", &["terrain"], &["sidewalks"]),
            script("0004_trees", &["terrain", "sidewalks"], &["trees"]),
        ])
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::build(&Ledger::new());
        assert!(graph.is_empty());
        assert!(graph.issues().is_empty());
    }

    #[test]
    fn builds_edges_from_producer_to_consumer() {
        let graph = DependencyGraph::build(&city());
        assert!(graph.issues().is_empty());
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.producer(&tags(&["terrain"])[0]), Some(&id("0002_terrain")));

        let deps = graph.dependencies(&id("0004_trees")).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.contains(&id("0002_terrain")));
        assert!(deps.contains(&id("0003_sidewalks")));

        let dependents = graph.dependents(&id("0002_terrain")).unwrap();
        assert_eq!(dependents.len(), 2);
        assert!(graph.node(&id("0001_origin")).unwrap().is_root());
    }

    #[test]
    fn duplicate_tag_is_collected_not_fatal() {
        let graph = DependencyGraph::build(&ledger(vec![
            script("0001_origin", &[], &["root"]),
            script("0002_a", &["root"], &["shared"]),
            script("0003_b", &["root"], &["shared"]),
            script("0004_c", &["shared"], &["c"]),
        ]));
        assert_eq!(
            graph.issues(),
            &[DagError::DuplicateTag {
                tag: tags(&["shared"])[0].clone(),
                first: id("0002_a"),
                second: id("0003_b"),
            }]
        );
        // The first producer wins, so the graph is still usable.
        assert_eq!(graph.producer(&tags(&["shared"])[0]), Some(&id("0002_a")));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn all_unresolved_names_are_reported() {
        let graph = DependencyGraph::build(&ledger(vec![
            script("0001_origin", &[], &["root"]),
            script("0002_a", &["root", "ghost"], &["a"]),
            script("0003_b", &["phantom"], &["b"]),
        ]));
        assert_eq!(graph.issues().len(), 2);
        assert!(graph.issues().iter().all(|i| matches!(i, DagError::UnresolvedDependency { .. })));
        assert!(matches!(
            DependencyGraph::try_build(&city()),
            Ok(g) if g.len() == 4
        ));
    }

    #[test]
    fn removal_adds_ordering_edge() {
        let cleanup = Entry::builder(id("0005_cleanup"), EntryKind::Remove, "cleanup.luau")
            .depends(tags(&["root"]))
            .removes(tags(&["trees"]))
            .build();
        let mut ledger = city();
        ledger.append(cleanup).unwrap();
        let graph = DependencyGraph::build(&ledger);

        let node = graph.node(&id("0005_cleanup")).unwrap();
        assert_eq!(node.parents_by_kind(EdgeKind::Removes).count(), 1);
        assert!(graph
            .dependencies(&id("0005_cleanup"))
            .unwrap()
            .contains(&id("0004_trees")));
    }

    #[test]
    fn ancestors_and_descendants() {
        let graph = DependencyGraph::build(&city());
        let ancestors = graph.ancestors(&id("0004_trees"));
        assert_eq!(ancestors.len(), 3);
        assert!(graph.ancestors(&id("0001_origin")).is_empty());

        let below = graph.descendants(&id("0002_terrain"), &[EdgeKind::Depends]);
        assert_eq!(below.len(), 2);
        assert!(below.contains(&id("0004_trees")));
    }

    #[test]
    fn unknown_entry_queries_fail() {
        let graph = DependencyGraph::build(&city());
        assert!(matches!(
            graph.dependencies(&id("9999_none")),
            Err(DagError::UnknownEntry(_))
        ));
    }
}
