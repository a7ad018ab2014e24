use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to parse config at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("invalid target filename: {0:?} (expected a plain file name)")]
    InvalidFilename(String),

    #[error("no download entries defined")]
    NoEntries,

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DownloadError>;
