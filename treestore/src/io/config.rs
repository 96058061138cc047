//! Store configuration stored as `treestore.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::StrictMode;

/// Store configuration (TOML).
///
/// Missing fields default to a non-strict store without mutation logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Strict-mode guard: `off`, `warn` or `panic`.
    pub strict: StrictMode,

    /// Install the mutation logger plugin.
    pub log_mutations: bool,

    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict: StrictMode::Off,
            log_mutations: false,
            log_filter: "warn".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            return Err(anyhow!("log_filter must be a non-empty filter directive"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `StoreConfig::default()`.
pub fn load_config(path: &Path) -> Result<StoreConfig> {
    if !path.exists() {
        let cfg = StoreConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: StoreConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &StoreConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_config_file;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, StoreConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("treestore.toml");
        let cfg = StoreConfig {
            strict: StrictMode::Panic,
            log_mutations: true,
            log_filter: "treestore=debug".to_string(),
        };
        write_config(&path, &cfg).expect("write");
        assert_eq!(load_config(&path).expect("load"), cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let (_dir, path) = write_config_file("strict = \"warn\"\n");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.strict, StrictMode::Warn);
        assert!(!cfg.log_mutations);
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn rejects_unknown_strict_mode_and_empty_filter() {
        let (_dir, path) = write_config_file("strict = \"sometimes\"\n");
        assert!(load_config(&path).is_err());

        let (_dir, path) = write_config_file("log_filter = \"  \"\n");
        let err = load_config(&path).expect_err("empty filter");
        assert!(err.to_string().contains("log_filter"));
    }
}
