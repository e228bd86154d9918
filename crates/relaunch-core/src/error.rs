use std::path::PathBuf;

use relaunch_fetch::FetchError;
use relaunch_manifest::ManifestError;
use thiserror::Error;

use crate::Phase;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while bringing the artifact mirror in line with a manifest.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to inspect cached copy of {path}")]
    Inspect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no download location for {path}")]
    Resolve {
        path: String,
        #[source]
        source: ManifestError,
    },

    #[error("failed to download {path}")]
    Transfer {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("downloaded {path} does not match the manifest")]
    Verification {
        path: String,
        #[source]
        source: FetchError,
    },
}

impl SyncError {
    /// Artifact path the failure belongs to.
    pub fn path(&self) -> &str {
        match self {
            SyncError::Inspect { path, .. }
            | SyncError::Resolve { path, .. }
            | SyncError::Transfer { path, .. }
            | SyncError::Verification { path, .. } => path,
        }
    }

    pub(crate) fn from_fetch(path: String, source: FetchError) -> Self {
        match source {
            FetchError::ChecksumMismatch { .. } | FetchError::SizeMismatch { .. } => {
                SyncError::Verification { path, source }
            }
            source => SyncError::Transfer { path, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("another instance is using {}", path.display())]
    LockUnavailable { path: PathBuf },

    #[error("failed to lock the cache root")]
    Lock(#[source] relaunch_fs::Error),

    #[error("no manifest is bundled with the launcher and none was given")]
    NoManifest,

    #[error("no manifest is bundled with the launcher and the given one is unavailable")]
    Bootstrap(#[source] ManifestError),

    #[error("no location available for the cache directory '{0}'")]
    NoCacheLocation(String),

    #[error("failed to prepare cache root {}", path.display())]
    CacheRoot {
        path: PathBuf,
        #[source]
        source: relaunch_fs::Error,
    },

    #[error("invalid launch parameter '{key}'")]
    InvalidParameter {
        key: String,
        #[source]
        source: ManifestError,
    },

    #[error("artifact synchronization failed")]
    Sync(#[from] SyncError),

    #[error("no cached artifacts in {}", path.display())]
    NoCachedArtifacts { path: PathBuf },

    #[error("failed to load '{target}'")]
    Load {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("application '{target}' failed")]
    Application {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to start the update worker")]
    Worker(#[source] std::io::Error),

    #[error("update worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, LaunchError>;

/// `err` and its sources joined by `": "`, for single-line log fields.
pub(crate) fn chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// A [`LaunchError`] tagged with the phase it ended.
#[derive(Debug, Error)]
#[error("error during {phase} phase")]
pub struct LaunchFailure {
    pub phase: Phase,
    #[source]
    pub error: LaunchError,
}

impl LaunchFailure {
    pub fn new(phase: Phase, error: LaunchError) -> Self {
        Self { phase, error }
    }

    /// Lock contention means another instance is already running; callers
    /// exit without surfacing it.
    pub fn is_silent(&self) -> bool {
        matches!(self.error, LaunchError::LockUnavailable { .. })
    }
}
