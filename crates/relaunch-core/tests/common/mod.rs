#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use relaunch_core::{
    BoxError, CacheResolver, EntryPoint, EntryPointLoader, ErrorReport, Event, LaunchContext,
    Orchestrator, Phase, ProgressSink,
};
use relaunch_fetch::{BoxStream, Fetcher, HttpClient};
use relaunch_manifest::{Artifact, Manifest};
use relaunch_platform::PlatformTag;
use relaunch_verify::Sha256Hasher;
use url::Url;

pub const BASE: &str = "https://updates.example.com/demo/";

#[derive(Debug)]
pub struct NotFound(pub String);

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "404 Not Found: {}", self.0)
    }
}

impl std::error::Error for NotFound {}

/// In-memory HTTP server keyed by full URL.
#[derive(Clone, Default)]
pub struct MockServer {
    files:    Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    pub fn put(&self, url: &str, body: &[u8]) {
        self.files.lock().unwrap().insert(url.to_string(), body.to_vec());
    }

    pub fn remove(&self, url: &str) {
        self.files.lock().unwrap().remove(url);
    }

    pub fn clear(&self) {
        self.files.lock().unwrap().clear();
    }

    /// Publish `manifest` as `<uri>/app.json` along with its artifact bodies.
    pub fn publish(&self, manifest: &Manifest, files: &[(&str, &[u8])]) {
        let base = manifest.uri().as_str();
        self.put(&format!("{base}app.json"), &manifest.to_vec_pretty().unwrap());
        for (path, body) in files {
            self.put(&format!("{base}{path}"), body);
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl HttpClient for MockServer {
    type Error = NotFound;

    async fn stream(
        &self,
        url: &Url,
        _headers: &[(String, String)],
    ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
        self.requests.lock().unwrap().push(url.to_string());
        let body = self
            .files
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| NotFound(url.to_string()))?;
        let chunks: Vec<Result<Bytes, NotFound>> = body
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

pub fn artifact(path: &str, body: &[u8]) -> Artifact {
    Artifact::new(path, body.len() as u64, Sha256Hasher::digest_hex(body), None).unwrap()
}

pub fn tagged(path: &str, body: &[u8], tag: &str) -> Artifact {
    let tag: PlatformTag = tag.parse().unwrap();
    Artifact::new(path, body.len() as u64, Sha256Hasher::digest_hex(body), Some(tag)).unwrap()
}

pub fn manifest(version: u64, artifacts: Vec<Artifact>) -> Manifest {
    Manifest::new("demo", Url::parse(BASE).unwrap(), version, "bin/demo")
        .with_artifacts(artifacts)
        .unwrap()
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
    pub errors: Vec<ErrorReport>,
}

impl RecordingSink {
    pub fn phases(&self) -> Vec<Phase> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::PhaseStarted(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Progress(f) => Some(*f),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn on_phase_start(&mut self, phase: Phase) {
        self.events.push(Event::PhaseStarted(phase));
    }

    fn on_progress(&mut self, fraction: f64) {
        self.events.push(Event::Progress(fraction));
    }

    fn on_status_text(&mut self, text: &str) {
        self.events.push(Event::Status(text.to_string()));
    }

    fn on_error(&mut self, report: &ErrorReport) {
        self.errors.push(report.clone());
    }
}

/// Loader that records every lifecycle call and insists the launch target
/// exists in the cache root.
#[derive(Clone, Default)]
pub struct TestLoader {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl TestLoader {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

struct TestApp {
    calls: Arc<Mutex<Vec<String>>>,
}

impl EntryPoint for TestApp {
    fn init(&mut self, context: LaunchContext) -> Result<(), BoxError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("init:{}", context.manifest.version()));
        Ok(())
    }

    fn start(&mut self) -> Result<(), BoxError> {
        self.calls.lock().unwrap().push("start".into());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        self.calls.lock().unwrap().push("stop".into());
        Ok(())
    }
}

impl EntryPointLoader for TestLoader {
    fn load(&self, cache_root: &Path, manifest: &Manifest) -> Result<Box<dyn EntryPoint>, BoxError> {
        self.calls.lock().unwrap().push("load".into());
        let target = manifest.launch_path(cache_root)?;
        if !target.is_file() {
            return Err(format!("{} not found", target.display()).into());
        }
        Ok(Box::new(TestApp {
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub type TestOrchestrator = Orchestrator<MockServer, TestLoader, RecordingSink>;

pub fn orchestrator(server: &MockServer, loader: &TestLoader, tmp: &Path) -> TestOrchestrator {
    Orchestrator::new(Fetcher::new(server.clone()), loader.clone(), RecordingSink::default())
        .with_resolver(CacheResolver::new(tmp).with_default_root(tmp.join("cache")))
}

pub fn cache_root(tmp: &Path) -> PathBuf {
    tmp.join("cache").join("demo")
}
