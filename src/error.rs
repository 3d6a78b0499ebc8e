use std::path::{Path, PathBuf};

/// Errors produced while building or persisting a weighted matrix.
///
/// Per-document problems during ingestion are logged and skipped; every
/// variant here aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or empty input folder, missing artifact
    #[error("input error: {0}")]
    Input(String),
    /// Frequency filtering left no terms
    #[error("vocabulary error: {0}")]
    Vocabulary(String),
    /// No documents, or an average document length of zero
    #[error("degenerate corpus: {0}")]
    DegenerateCorpus(String),
    /// Row or column counts disagree between matrix and metadata
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("run cancelled before the matrix was complete")]
    Cancelled,
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cbor encoding failed: {0}")]
    Cbor(#[from] serde_cbor::Error),
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config file parse failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io { path: path.as_ref().to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
