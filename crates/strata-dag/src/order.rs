//! Cycle detection and deterministic application order.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use strata_types::EntryId;
use tracing::{debug, warn};

use crate::error::{DagError, DagResult};
use crate::graph::DependencyGraph;

/// Heap key that orders entry ids by their numeric hint.
#[derive(PartialEq, Eq)]
struct OrdinalKey<'a>(&'a EntryId);

impl Ord for OrdinalKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_by_ordinal(other.0)
    }
}

impl PartialOrd for OrdinalKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

impl DependencyGraph {
    /// Entry ids sorted by ordering hint.
    fn by_ordinal<'a>(&self, ids: impl Iterator<Item = &'a EntryId>) -> Vec<&'a EntryId> {
        let mut ids: Vec<&EntryId> = ids.collect();
        ids.sort_by(|a, b| a.cmp_by_ordinal(b));
        ids
    }

    /// Every cycle reachable by a three-colour DFS.
    ///
    /// Each back-edge yields one cycle, listed in edge order starting from
    /// the entry the back-edge points to. An entry that depends on its own
    /// tag is a cycle of length one. Roots and children are visited in
    /// ordinal order so the result is stable.
    pub fn find_cycles(&self) -> Vec<Vec<EntryId>> {
        let mut colour: HashMap<&EntryId, Colour> =
            self.declared().iter().map(|id| (id, Colour::White)).collect();
        let mut cycles = Vec::new();

        for root in self.by_ordinal(self.declared().iter()) {
            if colour.get(root) != Some(&Colour::White) {
                continue;
            }

            // Explicit stack of (node, sorted children, next child index).
            let mut path: Vec<&EntryId> = vec![root];
            let mut stack = vec![(root, self.by_ordinal(self.children_of(root)), 0usize)];
            colour.insert(root, Colour::Grey);

            while let Some((node, children, next)) = stack.last_mut() {
                let Some(&child) = children.get(*next) else {
                    colour.insert(*node, Colour::Black);
                    stack.pop();
                    path.pop();
                    continue;
                };
                *next += 1;

                match colour.get(child).copied().unwrap_or(Colour::Black) {
                    Colour::White => {
                        colour.insert(child, Colour::Grey);
                        path.push(child);
                        stack.push((child, self.by_ordinal(self.children_of(child)), 0));
                    }
                    Colour::Grey => {
                        let start = path.iter().position(|id| *id == child).unwrap_or(0);
                        let cycle: Vec<EntryId> =
                            path[start..].iter().map(|id| (*id).clone()).collect();
                        warn!(cycle = %crate::format_cycle(&cycle), "dependency cycle detected");
                        cycles.push(cycle);
                    }
                    Colour::Black => {}
                }
            }
        }

        cycles
    }

    /// The order in which entries must be applied.
    ///
    /// Kahn's algorithm over distinct producer edges. When several entries
    /// are ready at once, the one with the lowest numeric hint goes first
    /// (so `9_x` precedes `10_y`); declaration order never matters.
    ///
    /// Unresolved dependencies contribute no edge, so callers that need a
    /// sound order should validate first. Fails with [`DagError::Cycle`] if
    /// any entry can never become ready.
    pub fn topological_order(&self) -> DagResult<Vec<EntryId>> {
        let mut in_degree: HashMap<&EntryId, usize> = self
            .nodes()
            .map(|node| (&node.id, node.producers().count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<OrdinalKey<'_>>> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(id, _)| Reverse(OrdinalKey(*id)))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse(OrdinalKey(id))) = ready.pop() {
            order.push(id.clone());
            for child in self.children_of(id) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(OrdinalKey(child)));
                    }
                }
            }
        }

        if order.len() != self.len() {
            let path = self.find_cycles().into_iter().next().unwrap_or_else(|| {
                // Unreachable for a well-formed graph; report what is stuck.
                let mut stuck: Vec<EntryId> = in_degree
                    .iter()
                    .filter(|&(_, &d)| d > 0)
                    .map(|(id, _)| (*id).clone())
                    .collect();
                stuck.sort_by(|a, b| a.cmp_by_ordinal(b));
                stuck
            });
            return Err(DagError::Cycle { path });
        }

        debug!(entries = order.len(), "computed application order");
        Ok(order)
    }
}
