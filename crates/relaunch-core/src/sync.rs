//! Artifact synchronization.
//!
//! Artifacts are compared against the cache root one by one and every stale
//! or missing one is transferred, strictly in manifest order. Transfers go
//! through a staging file, so an interrupted run never leaves a truncated
//! artifact in place.

use std::path::Path;

use relaunch_fetch::{Expected, Fetcher, HttpClient};
use relaunch_manifest::{Artifact, Manifest};
use relaunch_platform::Platform;

use crate::{Reporter, SYNC_SHARE, SyncError};

/// Artifacts that must be transferred, in manifest order.
#[derive(Debug, Clone)]
pub struct SyncPlan<'m> {
    pending:     Vec<&'m Artifact>,
    total_bytes: u64,
}

impl<'m> SyncPlan<'m> {
    pub fn pending(&self) -> &[&'m Artifact] { &self.pending }

    pub fn total_bytes(&self) -> u64 { self.total_bytes }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub transferred: usize,
    pub bytes:       u64,
}

pub struct SyncEngine<'a, C: HttpClient> {
    fetcher:  &'a Fetcher<C>,
    platform: Platform,
}

impl<'a, C: HttpClient> SyncEngine<'a, C> {
    pub fn new(fetcher: &'a Fetcher<C>) -> Self {
        Self {
            fetcher,
            platform: Platform::current(),
        }
    }

    /// Sync for another platform than the running one.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Eligible artifacts whose cached copy is missing or stale.
    pub fn plan<'m>(&self, manifest: &'m Manifest, cache_root: &Path) -> Result<SyncPlan<'m>, SyncError> {
        let mut pending = Vec::new();
        for artifact in manifest.artifacts_for(self.platform) {
            let stale = artifact
                .needs_update_on(cache_root, &self.platform)
                .map_err(|source| SyncError::Inspect {
                    path: artifact.path().to_string(),
                    source,
                })?;
            if stale {
                pending.push(artifact);
            }
        }

        let total_bytes = pending.iter().map(|a| a.size()).sum();
        Ok(SyncPlan { pending, total_bytes })
    }

    /// Bring `cache_root` in line with `manifest`.
    ///
    /// Progress is reported through `reporter` as a non-decreasing fraction
    /// ending at exactly [`SYNC_SHARE`]. The first failure aborts the run;
    /// artifacts already placed stay in place.
    pub async fn sync(
        &self,
        manifest: &Manifest,
        cache_root: &Path,
        reporter: &Reporter,
    ) -> Result<SyncReport, SyncError> {
        let plan = self.plan(manifest, cache_root)?;
        if plan.is_empty() {
            tracing::info!("all artifacts up to date");
            reporter.progress(SYNC_SHARE);
            return Ok(SyncReport::default());
        }

        tracing::info!(
            artifacts = plan.pending.len(),
            bytes = plan.total_bytes,
            "synchronizing artifacts"
        );

        let total = plan.total_bytes;
        let mut written = 0u64;
        reporter.progress(0.0);

        for artifact in plan.pending() {
            let path = artifact.path().to_string();
            let url = manifest
                .artifact_url(artifact)
                .map_err(|source| SyncError::Resolve {
                    path: path.clone(),
                    source,
                })?;
            let expected = Expected {
                size:   artifact.size(),
                sha256: artifact.checksum().to_string(),
            };

            reporter.status(format!("Downloading {path}"));
            tracing::debug!(artifact = %path, url = %relaunch_fetch::request_url(&url), "transfer");

            self.fetcher
                .fetch_to_file(&url, &artifact.local_path(cache_root), Some(&expected), |len| {
                    written += len;
                    reporter.progress(sync_fraction(written, total));
                })
                .await
                .map_err(|source| SyncError::from_fetch(path.clone(), source))?;
        }

        reporter.progress(SYNC_SHARE);
        Ok(SyncReport {
            transferred: plan.pending.len(),
            bytes:       written,
        })
    }
}

fn sync_fraction(written: u64, total: u64) -> f64 {
    if total == 0 {
        return SYNC_SHARE;
    }
    (written.min(total) as f64 / total as f64) * SYNC_SHARE
}
