//! Data layer: immutable transfer configuration.

use std::time::Duration;

/// Chunk size used when streaming local sources and copying buffers.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Connect and read timeouts for the HTTP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read:    Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            read:    Duration::from_secs(60),
        }
    }
}

/// What a transferred body must look like before it is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub size:   u64,
    /// Lowercase hex SHA-256 digest.
    pub sha256: String,
}
