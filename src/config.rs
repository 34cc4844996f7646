//! Engine configuration, persisted as TOML.
//!
//! ```toml
//! schema_file_name = "structure.txt"
//!
//! [validate]
//! unbounded_beyond_one = true
//! simulation = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::validate::ValidateConfig;

/// Default schema file name inside a model directory.
pub const DEFAULT_SCHEMA_FILE: &str = "structure.txt";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructuraConfig {
    /// File name of the schema inside a model directory.
    pub schema_file_name: String,
    /// Validation policy.
    pub validate: ValidateConfig,
}

impl Default for StructuraConfig {
    fn default() -> Self {
        Self {
            schema_file_name: DEFAULT_SCHEMA_FILE.to_string(),
            validate: ValidateConfig::default(),
        }
    }
}

impl StructuraConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Schema file path inside `model_dir`.
    pub fn schema_path(&self, model_dir: &Path) -> PathBuf {
        model_dir.join(&self.schema_file_name)
    }
}
