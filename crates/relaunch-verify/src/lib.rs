//! Content verification primitives for cached artifacts.
//!
//! Hashing is incremental so the same pass that moves bytes can digest them,
//! and a whole file can be digested without loading it into memory.
//!
//! # Example
//!
//! ```
//! use relaunch_verify::{Hasher, Sha256Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(b"hello world");
//!
//! let mut reader = VerifiedReader::new(&data[..], Sha256Hasher::new());
//! let mut buffer = [0u8; 32];
//! while reader.read(&mut buffer).unwrap() > 0 {}
//!
//! reader.finish(&expected).unwrap();
//! ```

pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, verify_digest};
pub use self::reader::VerifiedReader;

#[cfg(feature = "sha256")]
pub use self::file::{FileDigest, digest_file};
#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

mod error;
#[cfg(feature = "sha256")]
mod file;
mod hasher;
mod reader;
