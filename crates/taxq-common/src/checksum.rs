//! Checksum utilities for archive and artifact verification
//!
//! NCBI publishes an MD5 digest next to every taxdump archive; artifacts
//! written by the loader are fingerprinted with SHA-256 in the manifest.

use crate::error::{Result, TaxqError};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute the lowercase hex MD5 digest of a byte slice
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Compute the SHA-256 digest of any readable source
pub fn sha256_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of a file
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    sha256_reader(&mut file)
}

/// Extract the digest from an `.md5` sidecar file
///
/// The format is `<hex digest>  <file name>`; only the digest is returned.
pub fn parse_md5_sidecar(content: &str) -> Result<String> {
    let digest = content
        .split_whitespace()
        .next()
        .ok_or_else(|| TaxqError::parse("empty md5 file"))?;

    if digest.len() != 32 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TaxqError::parse(format!("not an md5 digest: {}", digest)));
    }

    Ok(digest.to_ascii_lowercase())
}

/// Verify that `data` hashes to the expected MD5 digest
pub fn verify_md5(file: &str, data: &[u8], expected: &str) -> Result<()> {
    let actual = md5_hex(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(TaxqError::ChecksumMismatch {
            file: file.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
