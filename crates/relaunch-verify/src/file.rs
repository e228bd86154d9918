use std::fs::File;
use std::io;
use std::path::Path;

use crate::{Sha256Hasher, VerifiedReader};

/// Size and SHA-256 digest of a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub size: u64,
    pub sha256: Vec<u8>,
}

impl FileDigest {
    pub fn hex(&self) -> String { hex::encode(&self.sha256) }
}

/// Digest a file in a single streaming pass; `Ok(None)` if it does not exist.
pub fn digest_file(path: &Path) -> io::Result<Option<FileDigest>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut reader = VerifiedReader::new(file, Sha256Hasher::new());
    let size = reader.drain()?;
    Ok(Some(FileDigest {
        size,
        sha256: reader.into_digest(),
    }))
}
