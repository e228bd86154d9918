//! Error types for relaunch-fetch.

use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("file I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] relaunch_fs::Error),
}

impl FetchError {
    pub(crate) fn network<E>(url: &url::Url, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        FetchError::Network {
            url: crate::request_url(url).to_string(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
