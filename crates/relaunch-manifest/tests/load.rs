use bytes::Bytes;
use relaunch_fetch::{BoxStream, Fetcher, HttpClient};
use relaunch_manifest::{Manifest, ManifestError, parse_location};
use tempfile::tempdir;
use url::Url;

#[derive(Debug)]
struct TestError;

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("not found")
    }
}

impl std::error::Error for TestError {}

struct StaticClient(Option<&'static str>);

impl HttpClient for StaticClient {
    type Error = TestError;

    async fn stream(
        &self,
        _url: &Url,
        _headers: &[(String, String)],
    ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
        let body = self.0.ok_or(TestError)?;
        Ok(Box::pin(futures_util::stream::iter(vec![Ok(Bytes::from_static(
            body.as_bytes(),
        ))])))
    }
}

const DOC: &str = r#"{"name":"demo","uri":"https://example.com/demo/","version":3,"launch_target":"bin/demo"}"#;

#[tokio::test]
async fn test_load_remote() {
    let fetcher = Fetcher::new(StaticClient(Some(DOC)));
    let url = Url::parse("https://example.com/demo/app.json").unwrap();
    let m = Manifest::load(&url, &fetcher).await.unwrap();
    assert_eq!(m.version(), 3);
}

#[tokio::test]
async fn test_load_failures_are_unavailable() {
    let url = Url::parse("https://user:pw@example.com/demo/app.json").unwrap();

    let missing = Manifest::load(&url, &Fetcher::new(StaticClient(None))).await;
    match missing {
        Err(ManifestError::Unavailable { location, .. }) => {
            assert_eq!(location, "https://example.com/demo/app.json")
        }
        other => panic!("unexpected: {other:?}"),
    }

    let garbage = Manifest::load(&url, &Fetcher::new(StaticClient(Some("<xml/>")))).await;
    assert!(matches!(garbage, Err(ManifestError::Unavailable { .. })));
}

#[tokio::test]
async fn test_persist_then_load_file() {
    let dir = tempdir().unwrap();
    let fetcher = Fetcher::new(StaticClient(Some(DOC)));
    let m = Manifest::load(&Url::parse("https://example.com/demo/app.json").unwrap(), &fetcher)
        .await
        .unwrap();

    let path = m.persist(dir.path()).unwrap();
    assert_eq!(path, Manifest::path_in(dir.path()));
    assert_eq!(Manifest::load_file(&path).unwrap(), m);

    let via_url = parse_location(path.to_str().unwrap(), dir.path()).unwrap();
    assert_eq!(Manifest::load(&via_url, &fetcher).await.unwrap(), m);
}
