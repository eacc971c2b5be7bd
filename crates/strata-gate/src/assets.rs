//! Asset-existence boundary.

use std::collections::BTreeSet;

/// Host-supplied view of the asset store.
///
/// The validation engine never touches the filesystem itself; it asks this
/// collaborator whether an asset entry's `source` exists and, optionally,
/// which assets exist at all (so unreferenced ones can be reported).
pub trait AssetCheck: Send + Sync {
    /// Whether the asset at `source` exists.
    fn exists(&self, source: &str) -> bool;

    /// Every asset the host knows about. The default reports none, which
    /// disables orphan detection.
    fn inventory(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A fixed set of asset locators, mainly for tests and embedding.
impl AssetCheck for BTreeSet<String> {
    fn exists(&self, source: &str) -> bool {
        self.contains(source)
    }

    fn inventory(&self) -> Vec<String> {
        self.iter().cloned().collect()
    }
}

impl<A: AssetCheck + ?Sized> AssetCheck for &A {
    fn exists(&self, source: &str) -> bool {
        (**self).exists(source)
    }

    fn inventory(&self) -> Vec<String> {
        (**self).inventory()
    }
}
