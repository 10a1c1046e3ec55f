use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableDbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode table '{table}': {source}")]
    Encode {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render document: {0}")]
    Render(#[source] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TableDbError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TableDbError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TableDbError>;
