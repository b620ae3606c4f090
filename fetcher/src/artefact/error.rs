//! Error types for artefact acquisition and verification.
//!
//! Filesystem failures, fetch failures, and integrity failures are kept
//! apart so callers can tell an operational hiccup from an untrusted file.

use super::download::FetchError;
use super::sha256_digest::Sha256Digest;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use thiserror::Error;

/// What happened to a file that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The file was removed from the target path.
    Deleted,
    /// The file was moved aside to the given path.
    Quarantined {
        /// Where the untrusted file now lives.
        to: Utf8PathBuf,
    },
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::Quarantined { to } => write!(f, "quarantined to {to}"),
        }
    }
}

/// Errors arising from artefact operations.
#[derive(Debug, Error)]
pub enum ArtefactError {
    /// A local filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being accessed.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The artefact could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The file on disk does not match the expected digest.
    #[error(
        "integrity check failed for {path}: expected {expected}, found {found}; the untrusted file was {disposition}"
    )]
    Integrity {
        /// The target path that was verified.
        path: Utf8PathBuf,
        /// The digest the caller expected.
        expected: String,
        /// The digest computed from the file.
        found: Sha256Digest,
        /// What happened to the untrusted file.
        disposition: Disposition,
    },
}

impl ArtefactError {
    /// Build an [`ArtefactError::Io`] for `path`.
    #[must_use]
    pub fn io(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }

    /// Return true when this error reports an integrity failure.
    #[must_use]
    pub const fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
