use bladematch_core::GeometryError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("case directory {0:?} already exists and overwrite is disabled")]
    DirectoryConflict(PathBuf),
    #[error("expected optimizer output is missing: {0:?}")]
    MissingExpectedArtifact(PathBuf),
    #[error("malformed config at line {line}: {reason}")]
    MalformedConfig { line: usize, reason: String },
    #[error("config key `{key}`: {reason}")]
    ConfigValue { key: String, reason: String },
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },
    #[error("failed to launch optimizer `{program}`")]
    OptimizerLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("station manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("{0}")]
    InvalidState(String),
    #[error(transparent)]
    Format(#[from] std::fmt::Error),
}

impl MatchError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        MatchError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn value(key: &str, reason: impl Into<String>) -> Self {
        MatchError::ConfigValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
