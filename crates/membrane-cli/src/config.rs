//! CLI configuration file
//!
//! ```toml
//! [store.limits]
//! max_children = 4
//!
//! [store.init]
//! kind = "zeros"
//!
//! [sync]
//! default_strategy = "blend"
//! ```

use anyhow::{Context, Result};
use membrane_core::MembraneConfig;
use membrane_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the `membrane` binary reads from its config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Store limits and buffer initialization
    pub store: MembraneConfig,
    /// Sync engine policy for `sync` script commands
    pub sync: SyncConfig,
}

impl CliConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse config")?;
        config.store.validate()?;
        Ok(config)
    }
}

/// Load configuration from `path`; a missing file means defaults
pub fn load_config(path: &Path) -> Result<CliConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(CliConfig::default());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = CliConfig::from_toml_str(&source)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use membrane_sync::MergeStrategy;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_tables_are_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store.limits]\nmax_children = 3\n\n[sync]\ndefault_strategy = \"split\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.store.limits.max_children, 3);
        assert_eq!(config.sync.default_strategy, MergeStrategy::Split);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        assert!(CliConfig::from_toml_str("[store.limits]\nmax_depth = 0").is_err());
    }
}
