#[cfg(feature = "sha256")]
use sha2::Digest;

use crate::{Result, VerificationError};

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

/// Finalize `hasher` and compare the digest with `expected`.
pub fn verify_digest<H: Hasher>(hasher: H, expected: &[u8]) -> Result<()> {
    let actual = hasher.finalize();
    if actual == expected {
        Ok(())
    } else {
        Err(VerificationError::Mismatch {
            expected: expected.to_vec(),
            actual,
        })
    }
}

#[cfg(feature = "sha256")]
pub struct Sha256Hasher(sha2::Sha256);

#[cfg(feature = "sha256")]
impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

#[cfg(feature = "sha256")]
impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "sha256")]
impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }

    pub fn digest_hex(data: &[u8]) -> String { hex::encode(Self::digest(data)) }
}

#[cfg(all(test, feature = "sha256"))]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hasher() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let expected =
            hex::decode("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
                .unwrap();
        assert_eq!(hasher.finalize(), expected);
    }

    #[test]
    fn test_verify_digest() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"abc");
        verify_digest(hasher, &Sha256Hasher::digest(b"abc")).unwrap();

        let mut hasher = Sha256Hasher::new();
        hasher.update(b"abd");
        assert!(matches!(
            verify_digest(hasher, &Sha256Hasher::digest(b"abc")),
            Err(VerificationError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_digest_hex() {
        assert_eq!(
            Sha256Hasher::digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
