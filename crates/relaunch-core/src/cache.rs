//! Cache root resolution.
//!
//! Precedence, first match wins:
//!
//! 1. the `cache-dir` launch parameter
//! 2. the manifest's `cache_dir`
//! 3. `<user cache>/relaunch/<name>`
//!
//! Explicit locations may start with `USERLIB/` (per-user data directory)
//! or `ALLUSERS/` (machine-wide data directory). Other relative locations
//! are taken relative to the launcher's base directory.

use std::path::{Path, PathBuf};

use relaunch_manifest::Manifest;
use relaunch_platform::dir;

use crate::{LaunchError, LaunchParams, Result};

/// Advisory lock file held in the cache root while an instance runs.
pub const LOCK_FILE: &str = ".relaunch.lock";

const USERLIB: &str = "USERLIB/";
const ALLUSERS: &str = "ALLUSERS/";

#[derive(Debug, Clone)]
pub struct CacheResolver {
    base_dir: PathBuf,
    user_lib: Option<PathBuf>,
    all_users: PathBuf,
    default_root: Option<PathBuf>,
}

impl CacheResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            user_lib: dir::user_data(),
            all_users: dir::shared_data(),
            default_root: dir::user_cache().map(|p| p.join("relaunch")),
        }
    }

    pub fn with_user_lib(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_lib = Some(path.into());
        self
    }

    pub fn with_all_users(mut self, path: impl Into<PathBuf>) -> Self {
        self.all_users = path.into();
        self
    }

    /// Parent of the per-application default roots.
    pub fn with_default_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_root = Some(path.into());
        self
    }

    /// Compute the cache root without touching the filesystem.
    pub fn locate(&self, manifest: &Manifest, params: &LaunchParams) -> Result<PathBuf> {
        if let Some(explicit) = params.named(LaunchParams::CACHE_DIR) {
            return self.expand(explicit);
        }
        if let Some(declared) = manifest.cache_dir() {
            return self.expand(declared);
        }
        self.default_root
            .as_ref()
            .map(|root| root.join(dir_name(manifest.name())))
            .ok_or_else(|| LaunchError::NoCacheLocation(manifest.name().to_string()))
    }

    /// [`locate`](Self::locate) and create the directory.
    pub fn resolve(&self, manifest: &Manifest, params: &LaunchParams) -> Result<PathBuf> {
        let root = self.locate(manifest, params)?;
        relaunch_fs::ensure_dir(&root).map_err(|source| LaunchError::CacheRoot {
            path: root.clone(),
            source,
        })?;
        tracing::debug!(cache_root = %root.display(), "cache root resolved");
        Ok(root)
    }

    fn expand(&self, raw: &str) -> Result<PathBuf> {
        if let Some(rest) = raw.strip_prefix(USERLIB) {
            return self
                .user_lib
                .as_ref()
                .map(|p| p.join(rest))
                .ok_or_else(|| LaunchError::NoCacheLocation(raw.to_string()));
        }
        if let Some(rest) = raw.strip_prefix(ALLUSERS) {
            return Ok(self.all_users.join(rest));
        }

        let path = Path::new(raw);
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        })
    }
}

fn dir_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "app".to_string(),
        _ => cleaned,
    }
}
