//! Content hashing for quarantine audit records.

use crate::core::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

pub struct HashCalculator;

impl HashCalculator {
    /// SHA-256 of a file's content, hex-encoded, read in 64 KiB chunks.
    pub fn sha256_file(path: &Path) -> Result<String> {
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = Sha256::new();
        io::copy(&mut reader, &mut hasher).map_err(|e| Error::file_read(path, e))?;
        Ok(hex::encode(hasher.finalize()))
    }

    /// SHA-256 of an in-memory buffer, hex-encoded.
    pub fn sha256_bytes(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sha256_bytes() {
        // Test vector: SHA256("hello")
        let hash = HashCalculator::sha256_bytes(b"hello");
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_sha256_file_matches_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let hash = HashCalculator::sha256_file(file.path()).unwrap();
        assert_eq!(hash, HashCalculator::sha256_bytes(b"hello"));
    }

    #[test]
    fn test_sha256_missing_file() {
        let err = HashCalculator::sha256_file(Path::new("/no/such/file")).unwrap_err();
        assert!(err.is_recoverable());
    }
}
