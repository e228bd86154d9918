use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use relaunch_platform::{Platform, PlatformTag};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ManifestError, Result};

/// A relative, normalized, `/`-separated path inside the cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPath(String);

impl ArtifactPath {
    pub fn new(raw: &str) -> Result<Self> {
        let invalid = || ManifestError::InvalidArtifactPath(raw.to_string());
        if raw.starts_with('/') || raw.contains('\\') || raw.contains(':') {
            return Err(invalid());
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "." => continue,
                "" | ".." => return Err(invalid()),
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(invalid());
        }
        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Location of this path under `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, s| acc.join(s))
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for ArtifactPath {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> { Self::new(&value) }
}

impl From<ArtifactPath> for String {
    fn from(path: ArtifactPath) -> Self { path.0 }
}

/// One deployable file listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Entry", into = "Entry")]
pub struct Artifact {
    path:     ArtifactPath,
    size:     u64,
    /// Lowercase hex SHA-256 of the file content.
    checksum: String,
    platform: Option<PlatformTag>,
}

/// Wire shape of an artifact; normalized through [`Artifact::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    path:     String,
    size:     u64,
    checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform: Option<PlatformTag>,
}

impl TryFrom<Entry> for Artifact {
    type Error = ManifestError;

    fn try_from(entry: Entry) -> Result<Self> {
        Artifact::new(&entry.path, entry.size, entry.checksum, entry.platform)
    }
}

impl From<Artifact> for Entry {
    fn from(artifact: Artifact) -> Self {
        Entry {
            path:     artifact.path.into(),
            size:     artifact.size,
            checksum: artifact.checksum,
            platform: artifact.platform,
        }
    }
}

impl Artifact {
    pub fn new(
        path: &str,
        size: u64,
        checksum: impl Into<String>,
        platform: Option<PlatformTag>,
    ) -> Result<Self> {
        Ok(Self {
            path: ArtifactPath::new(path)?,
            size,
            checksum: checksum.into().trim().to_ascii_lowercase(),
            platform,
        })
    }

    pub fn path(&self) -> &ArtifactPath { &self.path }

    pub fn size(&self) -> u64 { self.size }

    pub fn checksum(&self) -> &str { &self.checksum }

    pub fn platform(&self) -> Option<PlatformTag> { self.platform }

    pub fn applies_to(&self, platform: &Platform) -> bool {
        self.platform.is_none_or(|tag| tag.matches(platform))
    }

    pub fn applies_to_current_platform(&self) -> bool { self.applies_to(&Platform::current()) }

    pub fn local_path(&self, cache_root: &Path) -> PathBuf { self.path.under(cache_root) }

    /// Absolute transfer location of this artifact under `base`.
    pub fn resolve_url(&self, base: &Url) -> Result<Url> {
        base.join(self.path.as_str())
            .map_err(|_| ManifestError::InvalidUri(format!("{base} + {}", self.path)))
    }

    /// Whether the copy under `cache_root` must be transferred again.
    ///
    /// Only local state is inspected. Ineligible artifacts never need an update.
    pub fn needs_update(&self, cache_root: &Path) -> io::Result<bool> {
        self.needs_update_on(cache_root, &Platform::current())
    }

    pub fn needs_update_on(&self, cache_root: &Path, platform: &Platform) -> io::Result<bool> {
        if !self.applies_to(platform) {
            return Ok(false);
        }

        let local = self.local_path(cache_root);
        let size = match std::fs::metadata(&local) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e),
        };
        if size != self.size {
            tracing::debug!(artifact = %self.path, expected = self.size, actual = size, "size differs");
            return Ok(true);
        }

        let Some(digest) = relaunch_verify::digest_file(&local)? else {
            return Ok(true);
        };
        let stale = !digest.hex().eq_ignore_ascii_case(&self.checksum);
        if stale {
            tracing::debug!(artifact = %self.path, "checksum differs");
        }
        Ok(stale)
    }
}
