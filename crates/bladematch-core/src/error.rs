use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("malformed geometry file (line {line}): {reason}")]
    MalformedGeometryFile { line: usize, reason: String },

    #[error("malformed exchange file (line {line}): {reason}")]
    MalformedExchangeFile { line: usize, reason: String },

    #[error("inconsistent surface shape: {0}")]
    ShapeMismatch(String),

    #[error("invalid axis order `{0}`, expected a permutation of \"xyz\"")]
    InvalidAxisOrder(String),

    #[error("leading edge has no points")]
    EmptyLeadingEdge,

    #[error("section {index} out of range ({count} sections)")]
    SectionOutOfRange { index: usize, count: usize },

    #[error("no cut wider than {min_width} found walking in from the {edge} edge")]
    FilletCutNotFound { edge: &'static str, min_width: f64 },

    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] std::fmt::Error),
}

impl GeometryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeometryError>;
