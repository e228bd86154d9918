use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown architecture: {0}")]
    UnknownArch(String),

    #[error("unknown operating system: {0}")]
    UnknownOS(String),

    #[error("invalid platform tag: {0}")]
    InvalidTag(String),
}
