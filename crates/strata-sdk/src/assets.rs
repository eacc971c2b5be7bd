//! Asset checks against a directory on disk.

use std::path::{Component, Path, PathBuf};

use strata_gate::AssetCheck;
use walkdir::WalkDir;

/// An [`AssetCheck`] over a directory tree.
///
/// Asset sources are paths relative to the directory, written with `/`
/// separators. Sources that try to escape the directory never exist.
#[derive(Clone, Debug)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetCheck for DirectoryAssets {
    fn exists(&self, source: &str) -> bool {
        let relative = Path::new(source);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained && self.root.join(relative).is_file()
    }

    fn inventory(&self) -> Vec<String> {
        if !self.root.is_dir() {
            return Vec::new();
        }
        let mut items: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(parts.join("/"))
            })
            .collect();
        items.sort();
        items
    }
}
