//! SHA-256 checksum computation for local files.

use super::error::{ArtefactError, Result};
use super::sha256_digest::Sha256Digest;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;

/// Compute the SHA-256 digest of a file.
///
/// Reads the file at `path` in 8 KiB chunks and returns the lowercase hex
/// digest as a [`Sha256Digest`]. Identical contents always yield
/// the identical digest.
///
/// # Errors
///
/// Returns [`ArtefactError::Io`] if the file does not exist or cannot be
/// read.
pub fn compute_sha256(path: &Utf8Path) -> Result<Sha256Digest> {
    let mut file = fs::File::open(path).map_err(|e| ArtefactError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ArtefactError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from(hasher.finalize()))
}

/// Compute the SHA-256 digest of an in-memory buffer.
///
/// # Examples
///
/// ```
/// use stackyard_fetcher::artefact::checksum::sha256_bytes;
///
/// let digest = sha256_bytes(b"hello");
/// assert_eq!(
///     digest.as_str(),
///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// ```
#[must_use]
pub fn sha256_bytes(data: &[u8]) -> Sha256Digest {
    Sha256Digest::from(Sha256::digest(data))
}
