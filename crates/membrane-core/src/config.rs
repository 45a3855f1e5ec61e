//! Store configuration: capacity limits and buffer initialization
//!
//! Limits default to 16 objects, 8 children and 64 membranes per store, and
//! can be overridden from TOML.
//!
//! ```toml
//! [limits]
//! max_children = 4
//!
//! [init]
//! kind = "random"
//! scale = 0.1
//! seed = 7
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range
    #[error("Invalid configuration: {field} - {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Capacity limits enforced by a membrane store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneLimits {
    /// Maximum number of axes in a shape
    pub max_axes: u32,
    /// Maximum distinct object symbols per membrane
    pub max_objects: u32,
    /// Maximum children per membrane
    pub max_children: u32,
    /// Maximum nesting depth, roots being at depth 1
    pub max_depth: u32,
    /// Maximum membranes alive in one store
    pub max_membranes: u32,
    /// Maximum scalar elements in one buffer
    pub max_volume: u64,
    /// Energy every new membrane starts with
    pub initial_energy: u32,
}

impl Default for MembraneLimits {
    fn default() -> Self {
        Self {
            max_axes: 16,
            max_objects: 16,
            max_children: 8,
            max_depth: 8,
            max_membranes: 64,
            max_volume: 1 << 24,
            initial_energy: 100,
        }
    }
}

/// How a freshly created buffer is filled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BufferInit {
    /// Every element starts at 0.0 (deterministic)
    #[default]
    Zeros,
    /// Uniform values in `[0, scale)`; deterministic only when seeded
    Random {
        /// Upper bound of the generated values
        scale: f32,
        /// Seed for a reproducible sequence; entropy when absent
        #[serde(default)]
        seed: Option<u64>,
    },
}

/// Complete store configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneConfig {
    /// Capacity limits
    pub limits: MembraneLimits,
    /// Buffer initialization policy
    pub init: BufferInit,
}

impl MembraneConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "Loaded membrane config");
        Ok(config)
    }

    /// Reject limits that would make every operation fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        let positive = [
            ("limits.max_axes", u64::from(limits.max_axes)),
            ("limits.max_objects", u64::from(limits.max_objects)),
            ("limits.max_children", u64::from(limits.max_children)),
            ("limits.max_membranes", u64::from(limits.max_membranes)),
            ("limits.max_depth", u64::from(limits.max_depth)),
            ("limits.max_volume", limits.max_volume),
            ("limits.initial_energy", u64::from(limits.initial_energy)),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if let BufferInit::Random { scale, .. } = self.init {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigError::Invalid {
                    field: "init.scale",
                    reason: format!("must be a positive finite number, got {scale}"),
                });
            }
        }

        Ok(())
    }
}
