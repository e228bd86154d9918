use std::io::{self, Read};

use crate::{Hasher, Result, verify_digest};

/// Reader adapter that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
    bytes_read: u64,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self {
            reader,
            hasher,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 { self.bytes_read }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }

    /// Drain the remaining input, hashing everything.
    pub fn drain(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 64 * 1024];
        while self.read(&mut buf)? > 0 {}
        Ok(self.bytes_read)
    }

    pub fn into_digest(self) -> Vec<u8> { self.hasher.finalize() }

    /// Finalize against an expected digest.
    pub fn finish(self, expected: &[u8]) -> Result<()> { verify_digest(self.hasher, expected) }
}
