use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Asynchronous HTTP client abstraction.
///
/// This is the minimal interface the launcher needs: a GET whose body comes
/// back as a stream of chunks. Implementations handle redirects, timeouts
/// and map non-success status codes to errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a GET request and return the response body as a stream.
    ///
    /// `url` never carries credentials; any authentication arrives in `headers`.
    fn stream(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error>>
    + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_client {
    use super::*;
    use crate::Timeouts;
    use reqwest::Client;

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new(timeouts: Timeouts) -> Result<Self, reqwest::Error> {
            let client = Client::builder()
                .connect_timeout(timeouts.connect)
                .read_timeout(timeouts.read)
                .user_agent(concat!("relaunch/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn stream(
            &self,
            url: &Url,
            headers: &[(String, String)],
        ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
            let mut request = self.client.get(url.clone());

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?.error_for_status()?;
            Ok(Box::pin(response.bytes_stream()))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;
