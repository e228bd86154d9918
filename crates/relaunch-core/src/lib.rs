//! Launch pipeline for self-updating applications.
//!
//! A launch runs in phases: resolve the cache root and take the instance
//! lock, refresh the manifest, bring the local artifact mirror in line with
//! it, then hand the cache root to an [`EntryPoint`].
//!
//! Network and disk work happens on a background worker. The caller's
//! [`ProgressSink`] only ever sees [`Event`]s drained on the calling thread.

pub use cache::{CacheResolver, LOCK_FILE};
pub use entry::{EntryPoint, EntryPointLoader, LaunchContext};
pub use error::{BoxError, LaunchError, LaunchFailure, Result, SyncError};
pub use orchestrator::{LaunchRequest, Orchestrator, RunningApp};
pub use params::{LaunchParams, SourceOverride};
pub use progress::{ErrorReport, Event, Phase, ProgressSink, Reporter, SYNC_SHARE};
pub use sync::{SyncEngine, SyncPlan, SyncReport};

pub mod cache;
mod entry;
mod error;
pub mod orchestrator;
mod params;
mod progress;
pub mod sync;
