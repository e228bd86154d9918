use std::path::{Path, PathBuf};

use relaunch_manifest::Manifest;

use crate::{BoxError, LaunchParams};

/// Everything the application is handed before it starts.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub cache_root: PathBuf,
    pub manifest:   Manifest,
    pub params:     LaunchParams,
}

impl LaunchContext {
    /// Manifest parameters followed by the launcher's own arguments.
    pub fn arguments(&self) -> Vec<String> {
        self.manifest
            .parameters()
            .iter()
            .chain(self.params.raw())
            .cloned()
            .collect()
    }
}

/// A loaded application.
pub trait EntryPoint: Send {
    fn init(&mut self, context: LaunchContext) -> Result<(), BoxError>;

    fn start(&mut self) -> Result<(), BoxError>;

    fn stop(&mut self) -> Result<(), BoxError>;

    /// Exit code once the application has finished on its own.
    fn try_wait(&mut self) -> Result<Option<i32>, BoxError> {
        Ok(None)
    }
}

/// Turns a manifest's launch target into an [`EntryPoint`].
pub trait EntryPointLoader: Send {
    fn load(&self, cache_root: &Path, manifest: &Manifest) -> Result<Box<dyn EntryPoint>, BoxError>;
}

impl<F> EntryPointLoader for F
where
    F: Fn(&Path, &Manifest) -> Result<Box<dyn EntryPoint>, BoxError> + Send,
{
    fn load(&self, cache_root: &Path, manifest: &Manifest) -> Result<Box<dyn EntryPoint>, BoxError> {
        self(cache_root, manifest)
    }
}
