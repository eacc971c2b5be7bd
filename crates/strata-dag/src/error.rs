//! Error types for the dependency graph.

use strata_types::{EntryId, TagName};

/// Structural problems found while building or ordering the graph.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    /// Two entries declare the same tag in `emits`.
    #[error("tag {tag} is emitted by both {first} and {second}")]
    DuplicateTag {
        tag: TagName,
        /// The producer that was registered first.
        first: EntryId,
        /// The entry whose declaration collided.
        second: EntryId,
    },

    /// A `depends` name that no entry emits.
    #[error("{entry} depends on {tag}, which no entry emits")]
    UnresolvedDependency { entry: EntryId, tag: TagName },

    /// A dependency cycle. `path` lists the entries in edge order; the last
    /// entry leads back to the first.
    #[error("dependency cycle: {}", format_cycle(.path))]
    Cycle { path: Vec<EntryId> },

    /// An id that is not part of the graph.
    #[error("unknown entry: {0}")]
    UnknownEntry(EntryId),
}

/// Render a cycle as `a -> b -> a`.
pub fn format_cycle(path: &[EntryId]) -> String {
    let mut parts: Vec<&str> = path.iter().map(EntryId::as_str).collect();
    if let Some(first) = path.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

/// Convenience alias for graph results.
pub type DagResult<T> = Result<T, DagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_renders_closed_path() {
        let path = vec![EntryId::new("1_a").unwrap(), EntryId::new("2_b").unwrap()];
        assert_eq!(format_cycle(&path), "1_a -> 2_b -> 1_a");
        let err = DagError::Cycle { path };
        assert_eq!(err.to_string(), "dependency cycle: 1_a -> 2_b -> 1_a");
    }

    #[test]
    fn self_loop_renders_as_length_one_cycle() {
        let path = vec![EntryId::new("3_c").unwrap()];
        assert_eq!(format_cycle(&path), "3_c -> 3_c");
    }
}
