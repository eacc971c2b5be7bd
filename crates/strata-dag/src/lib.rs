//! Dependency graph over a strata ledger.
//!
//! Entries are nodes; an edge runs from the entry that emits a tag to every
//! entry that depends on (or removes) it. The crate resolves tags, reports
//! duplicate producers and unresolved names, detects cycles with a
//! three-colour DFS, and computes the deterministic application order.

pub mod error;
pub mod graph;
pub mod node;
pub mod order;

pub use error::{format_cycle, DagError, DagResult};
pub use graph::DependencyGraph;
pub use node::{Edge, EdgeKind, GraphNode};
