//! Filesystem primitives for the relaunch cache root.
//!
//! - [`atomic_write`] replaces a file in one rename so readers never see a
//!   half-written manifest.
//! - [`StagedFile`] is a sibling staging path that only lands on its target
//!   when committed, and is removed on drop otherwise.
//! - [`InstanceLock`] is an advisory exclusive lock held for a process
//!   lifetime; dropping it releases the lock and deletes the lock file.

mod dir;
mod error;
mod lock;
mod primitives;

pub use dir::{ensure_dir, is_dir_empty};
pub use error::{Error, Result};
pub use lock::InstanceLock;
pub use primitives::{AtomicWriteOptions, StagedFile, atomic_read, atomic_write};
