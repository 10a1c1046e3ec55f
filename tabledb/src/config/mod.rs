use crate::error::{Result, TableDbError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read once when a database is opened.
///
/// Can be built in code or parsed from YAML:
///
/// ```yaml
/// path: data/scores.json
/// load_late: false
/// save_on_exit: true
/// pretty: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Skip the load normally performed while opening.
    #[serde(default)]
    pub load_late: bool,
    /// Save when the database is dropped or closed.
    #[serde(default = "default_save_on_exit")]
    pub save_on_exit: bool,
    /// Write indented JSON.
    #[serde(default)]
    pub pretty: bool,
}

fn default_save_on_exit() -> bool {
    true
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            path: path.into(),
            load_late: false,
            save_on_exit: true,
            pretty: false,
        }
    }

    pub fn load_late(mut self, load_late: bool) -> Self {
        self.load_late = load_late;
        self
    }

    pub fn save_on_exit(mut self, save_on_exit: bool) -> Self {
        self.save_on_exit = save_on_exit;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Parse a YAML configuration string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: DatabaseConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TableDbError::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(TableDbError::Config(
                "a document path is required".to_string(),
            ));
        }
        Ok(())
    }
}
