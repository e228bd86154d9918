use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest unavailable at {location}")]
    Unavailable {
        location: String,
        #[source]
        source: BoxError,
    },

    #[error("malformed manifest")]
    Parse(#[source] serde_json::Error),

    #[error("failed to encode manifest")]
    Encode(#[source] serde_json::Error),

    #[error("invalid artifact path '{0}': must be relative and stay inside the cache root")]
    InvalidArtifactPath(String),

    #[error("invalid launch target '{0}': must be a relative path inside the cache root")]
    InvalidLaunchTarget(String),

    #[error("artifact '{0}' is listed more than once")]
    DuplicateArtifact(String),

    #[error("invalid source URI '{0}'")]
    InvalidUri(String),

    #[error("failed to persist manifest")]
    Persist(#[from] relaunch_fs::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
