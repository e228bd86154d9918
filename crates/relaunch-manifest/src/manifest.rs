use std::collections::HashSet;
use std::path::{Path, PathBuf};

use relaunch_fetch::{Fetcher, HttpClient};
use relaunch_fs::{AtomicWriteOptions, atomic_write};
use relaunch_platform::Platform;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::location::base_url;
use crate::{Artifact, ArtifactPath, ManifestError, Result};

/// File name of the manifest, both at the source and inside a cache root.
pub const MANIFEST_FILE: &str = "app.json";

/// Versioned description of an application's artifacts and launch metadata.
///
/// Equality is field-for-field, artifact order included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Document", into = "Document")]
pub struct Manifest {
    name:             String,
    uri:              Url,
    version:          u64,
    launch_target:    String,
    accept_downgrade: bool,
    cache_dir:        Option<String>,
    parameters:       Vec<String>,
    artifacts:        Vec<Artifact>,
}

/// Wire shape of a manifest; validated into [`Manifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    name:             String,
    uri:              Url,
    version:          u64,
    launch_target:    String,
    #[serde(default)]
    accept_downgrade: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_dir:        Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parameters:       Vec<String>,
    #[serde(default)]
    artifacts:        Vec<Artifact>,
}

impl TryFrom<Document> for Manifest {
    type Error = ManifestError;

    fn try_from(doc: Document) -> Result<Self> {
        launch_path(&doc.launch_target)?;
        Manifest::new(doc.name, doc.uri, doc.version, doc.launch_target)
            .with_accept_downgrade(doc.accept_downgrade)
            .with_cache_dir(doc.cache_dir)
            .with_parameters(doc.parameters)
            .with_artifacts(doc.artifacts)
    }
}

/// The launch target follows the artifact path rules.
fn launch_path(target: &str) -> Result<ArtifactPath> {
    ArtifactPath::new(target).map_err(|_| ManifestError::InvalidLaunchTarget(target.to_string()))
}

impl From<Manifest> for Document {
    fn from(m: Manifest) -> Self {
        Document {
            name:             m.name,
            uri:              m.uri,
            version:          m.version,
            launch_target:    m.launch_target,
            accept_downgrade: m.accept_downgrade,
            cache_dir:        m.cache_dir,
            parameters:       m.parameters,
            artifacts:        m.artifacts,
        }
    }
}

impl Manifest {
    pub fn new(
        name: impl Into<String>,
        uri: Url,
        version: u64,
        launch_target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: base_url(uri),
            version,
            launch_target: launch_target.into(),
            accept_downgrade: false,
            cache_dir: None,
            parameters: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_accept_downgrade(mut self, accept: bool) -> Self {
        self.accept_downgrade = accept;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<String>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Replace the artifact list; paths must be unique.
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Result<Self> {
        let mut seen = HashSet::new();
        for artifact in &artifacts {
            if !seen.insert(artifact.path().as_str()) {
                return Err(ManifestError::DuplicateArtifact(artifact.path().to_string()));
            }
        }
        self.artifacts = artifacts;
        Ok(self)
    }

    /// The same manifest pointed at another source base.
    pub fn with_uri(mut self, uri: Url) -> Self {
        self.uri = base_url(uri);
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn uri(&self) -> &Url { &self.uri }

    pub fn version(&self) -> u64 { self.version }

    pub fn launch_target(&self) -> &str { &self.launch_target }

    /// Location of the launch target under `cache_root`.
    pub fn launch_path(&self, cache_root: &Path) -> Result<PathBuf> {
        Ok(launch_path(&self.launch_target)?.under(cache_root))
    }

    pub fn accept_downgrade(&self) -> bool { self.accept_downgrade }

    pub fn cache_dir(&self) -> Option<&str> { self.cache_dir.as_deref() }

    pub fn parameters(&self) -> &[String] { &self.parameters }

    pub fn artifacts(&self) -> &[Artifact] { &self.artifacts }

    /// Artifacts that apply to `platform`, in manifest order.
    pub fn artifacts_for(&self, platform: Platform) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(move |a| a.applies_to(&platform))
    }

    /// Strictly newer by version; equal versions are not newer.
    pub fn is_newer_than(&self, other: &Manifest) -> bool { self.version > other.version }

    /// Where the up-to-date copy of this manifest is published.
    pub fn remote_location(&self) -> Result<Url> {
        self.uri
            .join(MANIFEST_FILE)
            .map_err(|_| ManifestError::InvalidUri(self.uri.to_string()))
    }

    pub fn artifact_url(&self, artifact: &Artifact) -> Result<Url> { artifact.resolve_url(&self.uri) }

    /// Path of the persisted manifest inside `cache_root`.
    pub fn path_in(cache_root: &Path) -> PathBuf { cache_root.join(MANIFEST_FILE) }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(ManifestError::Parse)
    }

    pub fn to_vec_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(ManifestError::Encode)
    }

    /// Read a manifest from a local file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let unavailable = |source: crate::error::BoxError| ManifestError::Unavailable {
            location: path.display().to_string(),
            source,
        };
        let bytes = relaunch_fs::atomic_read(path).map_err(|e| unavailable(e.into()))?;
        Self::from_slice(&bytes).map_err(|e| unavailable(e.into()))
    }

    /// Fetch and parse a manifest from `location`.
    ///
    /// Every failure, transport or parse, is reported as
    /// [`ManifestError::Unavailable`].
    pub async fn load<C: HttpClient>(location: &Url, fetcher: &Fetcher<C>) -> Result<Self> {
        let unavailable = |source: crate::error::BoxError| ManifestError::Unavailable {
            location: relaunch_fetch::request_url(location).to_string(),
            source,
        };
        let bytes = fetcher
            .fetch_bytes(location)
            .await
            .map_err(|e| unavailable(e.into()))?;
        Self::from_slice(&bytes).map_err(|e| unavailable(e.into()))
    }

    /// Atomically write this manifest into `cache_root`.
    pub fn persist(&self, cache_root: &Path) -> Result<PathBuf> {
        let path = Self::path_in(cache_root);
        atomic_write(&path, &self.to_vec_pretty()?, AtomicWriteOptions::new().sync(true))?;
        tracing::info!(path = %path.display(), version = self.version, "manifest persisted");
        Ok(path)
    }
}
