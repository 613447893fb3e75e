// src/error.rs

use thiserror::Error;

/// Errors produced by the ingestion pipeline.
///
/// `EmptyDocument` and `MissingColumns` abort before any network call.
/// `UploadTimeout` and `UploadRejected` are per-request: the orchestrator
/// records them against the failing chunk and keeps going, except on the
/// single-shot path where they fail the whole operation.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV file contains no data rows")]
    EmptyDocument,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("upload timed out; try a smaller file or try again")]
    UploadTimeout,

    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
