//! I/O operations for manifest and artifact transfer.

mod fetcher;
mod http;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
