//! Immutable description of one externally sourced artefact.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Suffix appended to the target path for quarantined files.
const QUARANTINE_SUFFIX: &str = "untrusted";

/// Suffix appended to the target path for the advisory lock file.
const LOCK_SUFFIX: &str = "lock";

/// Hash algorithm used to compute and compare artefact digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-256, rendered as 64 lowercase hex characters.
    #[default]
    Sha256,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Where an artefact comes from, where it lives locally, and what its
/// contents must hash to.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use stackyard_fetcher::artefact::descriptor::{ArtefactDescriptor, DigestAlgorithm};
///
/// let descriptor = ArtefactDescriptor::new(
///     "https://example.test/sentiment.zip",
///     Utf8PathBuf::from("data/sentiment.zip"),
///     "784cd852f324670fe324a65dc52a67d1f72d05f87677c0f487517b45fc1adc2d",
/// );
/// assert_eq!(descriptor.algorithm(), DigestAlgorithm::Sha256);
/// assert_eq!(descriptor.lock_path().as_str(), "data/sentiment.zip.lock");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactDescriptor {
    source: String,
    target: Utf8PathBuf,
    expected: String,
    algorithm: DigestAlgorithm,
}

impl ArtefactDescriptor {
    /// Describe an artefact verified with SHA-256.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<Utf8PathBuf>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            expected: expected.into(),
            algorithm: DigestAlgorithm::Sha256,
        }
    }

    /// The URI the artefact is fetched from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The local path the artefact is cached at.
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// The expected hex digest, exactly as supplied.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// The digest algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Path an untrusted file is moved to when quarantined.
    #[must_use]
    pub fn quarantine_path(&self) -> Utf8PathBuf {
        sibling_with_suffix(&self.target, QUARANTINE_SUFFIX)
    }

    /// Path of the advisory lock guarding this target.
    #[must_use]
    pub fn lock_path(&self) -> Utf8PathBuf {
        sibling_with_suffix(&self.target, LOCK_SUFFIX)
    }
}

fn sibling_with_suffix(path: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}.{suffix}"))
}
