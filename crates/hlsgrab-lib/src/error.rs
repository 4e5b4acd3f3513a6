use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HlsGrabError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Failed to create scratch directory at {path}: {reason}")]
    ScratchDirectoryCreation { path: PathBuf, reason: String },

    #[error("Failed to load batch manifest from {path}: {reason}")]
    ManifestLoad { path: PathBuf, reason: String },

    #[error("HTTP client error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] crate::engine::PoolError),

    #[error("Failed to submit download: {0}")]
    Submit(#[from] crate::engine::SubmitError),

    #[error("{failed} of {total} downloads did not complete")]
    DownloadsFailed { failed: usize, total: usize },

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
