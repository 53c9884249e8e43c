use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid corpus: {0}")]
    Corpus(String),

    #[error("Row {index} is outside the corpus ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Failed to vectorize passage {index}: {reason}")]
    Vectorize { index: usize, reason: String },

    #[error("Serialized batch not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Serialized batch is corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Serialized batch was produced by '{found}', current model is '{expected}'")]
    IncompatibleVocabulary { expected: String, found: String },

    #[error("Serialized batch holds {documents} documents but the corpus has {passages} passages; re-run vectorize")]
    MisalignedBatch { documents: usize, passages: usize },

    #[error("Gazetteer unavailable: {0}")]
    GazetteerUnavailable(String),

    #[error("Malformed gazetteer response: {0}")]
    GazetteerResponse(String),

    #[error("Map rendering failed: {0}")]
    Map(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
