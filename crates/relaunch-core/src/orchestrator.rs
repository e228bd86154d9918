//! Launch orchestration.
//!
//! [`Orchestrator::run`] moves all network and disk work onto a dedicated
//! worker thread with its own current-thread runtime. The calling thread
//! drains the worker's [`Event`]s into the [`ProgressSink`] until the worker
//! finishes, then surfaces the outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use relaunch_fetch::{Fetcher, HttpClient};
use relaunch_fs::{InstanceLock, is_dir_empty};
use relaunch_manifest::{Acceptance, Manifest, decide};
use relaunch_platform::Platform;

use crate::error::chain;
use crate::{
    BoxError, CacheResolver, EntryPoint, EntryPointLoader, ErrorReport, Event, LOCK_FILE,
    LaunchContext, LaunchError, LaunchFailure, LaunchParams, Phase, ProgressSink, Reporter, Result,
    SYNC_SHARE, SourceOverride, SyncEngine,
};

/// Inputs of a single launch.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Manifest shipped with the launcher, if any.
    pub embedded: Option<Manifest>,
    pub params:   LaunchParams,
    /// Directory relative cache locations and plain-path parameters resolve against.
    pub base_dir: PathBuf,
}

impl LaunchRequest {
    pub fn new(embedded: Option<Manifest>, params: LaunchParams, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            embedded,
            params,
            base_dir: base_dir.into(),
        }
    }
}

pub struct Orchestrator<C: HttpClient, L, S> {
    fetcher:  Arc<Fetcher<C>>,
    loader:   Arc<L>,
    sink:     S,
    resolver: Option<CacheResolver>,
    platform: Platform,
}

impl<C, L, S> Orchestrator<C, L, S>
where
    C: HttpClient + 'static,
    L: EntryPointLoader + Sync + 'static,
    S: ProgressSink,
{
    pub fn new(fetcher: Fetcher<C>, loader: L, sink: S) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            loader: Arc::new(loader),
            sink,
            resolver: None,
            platform: Platform::current(),
        }
    }

    /// Resolve cache roots with `resolver` instead of one built from the request's base directory.
    pub fn with_resolver(mut self, resolver: CacheResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run one launch to the point where the application has started.
    ///
    /// Blocks the calling thread, which is the only one that ever touches the
    /// sink. A lock held by another instance is returned without being
    /// reported to the sink.
    pub fn run(&mut self, request: LaunchRequest) -> std::result::Result<RunningApp, LaunchFailure> {
        let (reporter, events) = Reporter::channel();
        let worker = Worker {
            fetcher: Arc::clone(&self.fetcher),
            loader: Arc::clone(&self.loader),
            resolver: self
                .resolver
                .clone()
                .unwrap_or_else(|| CacheResolver::new(&request.base_dir)),
            platform: self.platform,
            request,
            reporter,
        };

        let handle = match std::thread::Builder::new()
            .name("relaunch-worker".into())
            .spawn(move || worker.run())
        {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(LaunchFailure::new(Phase::Init, LaunchError::Worker(e)))),
        };

        let mut last_phase = Phase::Init;
        for event in events {
            if let Event::PhaseStarted(phase) = event {
                last_phase = phase;
            }
            self.sink.dispatch(event);
        }

        let outcome = handle
            .join()
            .unwrap_or_else(|_| Err(LaunchFailure::new(last_phase, LaunchError::WorkerPanicked)));

        match outcome {
            Ok(app) => {
                tracing::info!(launch_target = app.manifest.launch_target(), "application running");
                self.sink.on_phase_start(Phase::Running);
                Ok(app)
            }
            Err(failure) => Err(self.fail(failure)),
        }
    }

    fn fail(&mut self, failure: LaunchFailure) -> LaunchFailure {
        if failure.is_silent() {
            tracing::info!(error = %failure.error, "another instance is already running");
            return failure;
        }

        let report = ErrorReport::new(failure.phase, &failure.error);
        tracing::error!(phase = %failure.phase, error = %chain(&failure.error), "launch failed");
        self.sink.on_phase_start(Phase::Failed);
        self.sink.on_error(&report);
        failure
    }
}

/// Handle to a started application.
///
/// Holds the instance lock; dropping the handle releases it and removes the
/// lock file.
pub struct RunningApp {
    app:        Box<dyn EntryPoint>,
    manifest:   Manifest,
    cache_root: PathBuf,
    lock:       InstanceLock,
}

impl RunningApp {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Exit code once the application has finished on its own.
    pub fn try_wait(&mut self) -> Result<Option<i32>> {
        self.app.try_wait().map_err(|source| LaunchError::Application {
            target: self.manifest.launch_target().to_string(),
            source,
        })
    }

    /// Stop the application and release the instance lock.
    pub fn stop(mut self) -> Result<()> {
        self.app.stop().map_err(|source| LaunchError::Application {
            target: self.manifest.launch_target().to_string(),
            source,
        })?;
        tracing::info!(launch_target = self.manifest.launch_target(), "application stopped");
        Ok(())
    }
}

impl fmt::Debug for RunningApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningApp")
            .field("name", &self.manifest.name())
            .field("version", &self.manifest.version())
            .field("cache_root", &self.cache_root)
            .field("lock", &self.lock.path())
            .finish_non_exhaustive()
    }
}

struct Worker<C: HttpClient, L> {
    fetcher:  Arc<Fetcher<C>>,
    loader:   Arc<L>,
    resolver: CacheResolver,
    platform: Platform,
    request:  LaunchRequest,
    reporter: Reporter,
}

impl<C, L> Worker<C, L>
where
    C: HttpClient,
    L: EntryPointLoader,
{
    fn run(self) -> std::result::Result<RunningApp, LaunchFailure> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LaunchFailure::new(Phase::Init, LaunchError::Worker(e)))?;

        let mut phase = Phase::Init;
        let result = runtime.block_on(self.drive(&mut phase));
        result.map_err(|error| LaunchFailure::new(phase, error))
    }

    fn fetcher(&self) -> &Fetcher<C> {
        &self.fetcher
    }

    fn enter(&self, phase: &mut Phase, next: Phase) {
        *phase = next;
        tracing::info!(phase = %next, "entering phase");
        self.reporter.phase(next);
    }

    async fn drive(&self, phase: &mut Phase) -> Result<RunningApp> {
        self.enter(phase, Phase::Init);
        let params = &self.request.params;
        let source = params.source_override(&self.request.base_dir)?;

        // Without a bundled manifest the override is the only identity source.
        let mut bootstrap = None;
        let seed = match (&self.request.embedded, &source) {
            (Some(embedded), _) => embedded.clone(),
            (None, Some(source)) => {
                let loaded = self.load_override(source).await.map_err(LaunchError::Bootstrap)?;
                bootstrap = Some(loaded.clone());
                loaded
            }
            (None, None) => return Err(LaunchError::NoManifest),
        };

        let cache_root = self.resolver.resolve(&seed, params)?;
        let lock = InstanceLock::try_acquire(cache_root.join(LOCK_FILE)).map_err(|e| match e {
            relaunch_fs::Error::LockHeld { path } => LaunchError::LockUnavailable { path },
            other => LaunchError::Lock(other),
        })?;

        let first_run = is_dir_empty(&cache_root, &[LOCK_FILE]).map_err(|source| {
            LaunchError::CacheRoot {
                path: cache_root.clone(),
                source,
            }
        })?;
        let current = if first_run {
            tracing::info!(cache_root = %cache_root.display(), "first run");
            seed
        } else {
            cached_or(seed, &cache_root)
        };

        self.enter(phase, Phase::ManifestSync);
        self.reporter.status("Checking for updates");
        let (current, refreshed) = self
            .sync_manifest(current, source.as_ref(), bootstrap, &cache_root)
            .await;

        if first_run && !refreshed {
            tracing::warn!("no manifest reachable on first run, skipping artifact sync");
        } else {
            self.enter(phase, Phase::ArtifactSync);
            let report = SyncEngine::new(self.fetcher())
                .with_platform(self.platform)
                .sync(&current, &cache_root, &self.reporter)
                .await?;
            tracing::info!(
                transferred = report.transferred,
                bytes = report.bytes,
                "artifacts synchronized"
            );
        }

        self.enter(phase, Phase::AppLoad);
        self.reporter.status(format!("Starting {}", current.name()));
        if first_run && !refreshed {
            return Err(LaunchError::NoCachedArtifacts { path: cache_root });
        }

        let load_error = |source: BoxError| LaunchError::Load {
            target: current.launch_target().to_string(),
            source,
        };
        let mut app = self.loader.load(&cache_root, &current).map_err(&load_error)?;
        self.reporter.progress(SYNC_SHARE + (1.0 - SYNC_SHARE) / 2.0);

        app.init(LaunchContext {
            cache_root: cache_root.clone(),
            manifest:   current.clone(),
            params:     params.clone(),
        })
        .map_err(&load_error)?;
        app.start().map_err(&load_error)?;
        self.reporter.progress(1.0);

        Ok(RunningApp {
            app,
            manifest: current,
            cache_root,
            lock,
        })
    }

    /// Refresh `current`; the flag is false when no manifest could be reached.
    ///
    /// Never fails: problems are logged and `current` is kept.
    async fn sync_manifest(
        &self,
        current: Manifest,
        source: Option<&SourceOverride>,
        bootstrap: Option<Manifest>,
        cache_root: &Path,
    ) -> (Manifest, bool) {
        if let Some(source) = source {
            let loaded = match bootstrap {
                Some(manifest) => Ok(manifest),
                None => self.load_override(source).await,
            };
            return match loaded {
                Ok(manifest) => {
                    tracing::info!(
                        version = manifest.version(),
                        pinned = source.is_pinned(),
                        "using manifest from launch parameters"
                    );
                    (manifest, true)
                }
                Err(e) => {
                    tracing::warn!(error = %chain(&e), "manifest from launch parameters unavailable");
                    // Still pinned: artifacts come from the given deployment.
                    match &source.uri {
                        Some(uri) => (current.with_uri(uri.clone()), false),
                        None => (current, false),
                    }
                }
            };
        }

        let remote = match current.remote_location() {
            Ok(location) => Manifest::load(&location, self.fetcher()).await,
            Err(e) => Err(e),
        };

        match decide(&current, remote) {
            Acceptance::Unavailable(e) => {
                tracing::warn!(error = %chain(&e), "keeping current manifest");
                (current, false)
            }
            Acceptance::Unchanged => {
                tracing::debug!(version = current.version(), "manifest unchanged");
                (current, true)
            }
            Acceptance::Accepted(remote) => {
                tracing::info!(from = current.version(), to = remote.version(), "manifest updated");
                if let Err(e) = remote.persist(cache_root) {
                    tracing::warn!(error = %chain(&e), "failed to persist manifest");
                }
                (remote, true)
            }
            Acceptance::Rejected(remote) => {
                tracing::info!(
                    current = current.version(),
                    remote = remote.version(),
                    "remote manifest is not newer, keeping current"
                );
                (current, true)
            }
        }
    }

    async fn load_override(&self, source: &SourceOverride) -> relaunch_manifest::Result<Manifest> {
        let location = source.location()?;
        let manifest = Manifest::load(&location, self.fetcher()).await?;
        Ok(match &source.uri {
            Some(uri) => manifest.with_uri(uri.clone()),
            None => manifest,
        })
    }
}

/// The manifest persisted in `cache_root`, or `seed` when there is none.
fn cached_or(seed: Manifest, cache_root: &Path) -> Manifest {
    let path = Manifest::path_in(cache_root);
    if !path.is_file() {
        return seed;
    }
    match Manifest::load_file(&path) {
        Ok(cached) => {
            tracing::debug!(version = cached.version(), "using cached manifest");
            cached
        }
        Err(e) => {
            tracing::warn!(error = %chain(&e), "ignoring unreadable cached manifest");
            seed
        }
    }
}
