use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use relaunch_fs::StagedFile;
use relaunch_verify::{Hasher, Sha256Hasher, VerificationError, verify_digest};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use crate::data::{CHUNK_SIZE, Expected};
use crate::effects::http::{BoxStream, HttpClient};
use crate::error::{FetchError, Result};

/// Resolves source URLs to byte streams and places transferred files.
///
/// `http`/`https` URLs go through the injected [`HttpClient`]; `file` URLs are
/// read from disk so a deployment can also live on a local or mounted path.
pub struct Fetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Open `url` as a stream of chunks.
    pub async fn open(&self, url: &Url) -> Result<BoxStream<'static, Result<Bytes>>> {
        match url.scheme() {
            "file" => open_file(url).await,
            "http" | "https" => {
                let headers: Vec<(String, String)> =
                    crate::basic_auth_header(url).into_iter().collect();
                let target = crate::request_url(url);
                tracing::debug!(url = %target, auth = !headers.is_empty(), "opening transfer");

                let stream = self
                    .client
                    .stream(&target, &headers)
                    .await
                    .map_err(|e| FetchError::network(url, e))?;
                let source = url.clone();
                Ok(Box::pin(stream.map(move |chunk| {
                    chunk.map_err(|e| FetchError::network(&source, e))
                })))
            }
            other => Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{other}' in {}",
                crate::request_url(url)
            ))),
        }
    }

    /// Read the whole body of `url` into memory.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let mut stream = self.open(url).await?;
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(body)
    }

    /// Stream `url` into `destination`, calling `on_chunk` with every chunk length.
    ///
    /// Bytes land in a staging file beside `destination` that is renamed over it
    /// only after the body is complete and matches `expected`. On any error the
    /// staging file is removed and `destination` is untouched.
    pub async fn fetch_to_file(
        &self,
        url: &Url,
        destination: &Path,
        expected: Option<&Expected>,
        mut on_chunk: impl FnMut(u64),
    ) -> Result<u64> {
        let staged = StagedFile::new(destination)?;
        let mut stream = self.open(url).await?;
        let mut file = tokio::fs::File::create(staged.path())
            .await
            .map_err(io_error(staged.path()))?;
        let mut hasher = expected.map(|_| Sha256Hasher::new());
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(ref mut h) = hasher {
                h.update(&chunk);
            }
            file.write_all(&chunk).await.map_err(io_error(staged.path()))?;
            written += chunk.len() as u64;
            on_chunk(chunk.len() as u64);
        }

        file.flush().await.map_err(io_error(staged.path()))?;
        file.sync_all().await.map_err(io_error(staged.path()))?;
        drop(file);

        if let (Some(expected), Some(h)) = (expected, hasher) {
            if written != expected.size {
                return Err(FetchError::SizeMismatch {
                    expected: expected.size,
                    actual: written,
                });
            }
            // Malformed hex never matches a real digest.
            let wanted = hex::decode(expected.sha256.trim()).unwrap_or_default();
            verify_digest(h, &wanted).map_err(|e| match e {
                VerificationError::Mismatch { actual, .. } => FetchError::ChecksumMismatch {
                    expected: expected.sha256.clone(),
                    actual:   hex::encode(actual),
                },
            })?;
        }

        staged.commit()?;
        Ok(written)
    }
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> FetchError + '_ {
    move |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn open_file(url: &Url) -> Result<BoxStream<'static, Result<Bytes>>> {
    let path: PathBuf = url
        .to_file_path()
        .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(io_error(&path))?;

    let chunks = futures_util::stream::try_unfold((file, path), |(mut file, path)| async move {
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        let n = file.read_buf(&mut buf).await.map_err(io_error(&path))?;
        if n == 0 {
            return Ok::<_, FetchError>(None);
        }
        Ok(Some((buf.freeze(), (file, path))))
    });
    Ok(Box::pin(chunks))
}
