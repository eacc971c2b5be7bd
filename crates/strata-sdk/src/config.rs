use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_exec::ExecutorConfig;

use crate::error::{SdkError, SdkResult};

/// Name of the optional project config file at the project root.
pub const CONFIG_FILE: &str = "strata.toml";

/// Project settings, read from `strata.toml`. Every field is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Ledger document, relative to the project root.
    pub ledger: PathBuf,
    /// Asset directory, relative to the project root.
    pub assets: PathBuf,
    /// Upper bound for one mutation body, in seconds.
    pub entry_timeout_secs: Option<u64>,
    /// Check asset entries against the asset directory during validation.
    pub check_assets: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from("migrations.toml"),
            assets: PathBuf::from("assets"),
            entry_timeout_secs: None,
            check_assets: true,
        }
    }
}

impl ProjectConfig {
    /// Read `strata.toml` from `root`, or the defaults if there is none.
    pub fn load(root: &Path) -> SdkResult<Self> {
        let path = root.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map_err(|reason| SdkError::Config { path, reason }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn entry_timeout(&self) -> Option<Duration> {
        self.entry_timeout_secs.map(Duration::from_secs)
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            entry_timeout: self.entry_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ProjectConfig::default();
        assert_eq!(c.ledger, PathBuf::from("migrations.toml"));
        assert_eq!(c.assets, PathBuf::from("assets"));
        assert!(c.check_assets);
        assert!(c.entry_timeout().is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = ProjectConfig::parse("entry_timeout_secs = 30\ncheck_assets = false\n").unwrap();
        assert_eq!(c.entry_timeout(), Some(Duration::from_secs(30)));
        assert!(!c.check_assets);
        assert_eq!(c.ledger, PathBuf::from("migrations.toml"));
        assert_eq!(c.executor_config().entry_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ProjectConfig::parse("ledgr = \"x.toml\"\n").is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProjectConfig::load(dir.path()).unwrap(), ProjectConfig::default());
    }

    #[test]
    fn malformed_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "check_assets = \"yes\"\n").unwrap();
        match ProjectConfig::load(dir.path()) {
            Err(SdkError::Config { path, .. }) => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
