//! Digests produced by the checksum engine.
//!
//! A [`Sha256Digest`] can only be built from hasher output, so it always
//! holds the 64 lowercase hex characters of a real SHA-256 sum. Expected
//! digests come from configuration and stay plain strings until
//! verification compares them against one of these.

use sha2::Sha256;
use sha2::digest::Output;
use std::fmt;

/// Lowercase hex rendering of a computed SHA-256 sum.
///
/// # Examples
///
/// ```
/// use sha2::{Digest, Sha256};
/// use stackyard_fetcher::artefact::sha256_digest::Sha256Digest;
///
/// let digest = Sha256Digest::from(Sha256::digest(b"abc"));
/// assert!(digest.as_str().starts_with("ba7816bf"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Output<Sha256>> for Sha256Digest {
    fn from(output: Output<Sha256>) -> Self {
        Self(format!("{output:x}"))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
