//! Fetch-verify orchestrator.
//!
//! [`ensure_artefact`] is the single entry point for making an artefact
//! available to downstream steps:
//!
//! 1. take the per-target lock;
//! 2. fetch the artefact only if the target path is empty;
//! 3. checksum whatever is now at the target path and compare it with the
//!    expected digest, on every run, cached or not;
//! 4. on mismatch, delete or quarantine the file and fail with
//!    [`ArtefactError::Integrity`];
//! 5. on match, hand back a [`VerifiedArtefact`].
//!
//! A [`VerifiedArtefact`] can only be obtained from this module, so anything
//! that accepts one is guaranteed to receive a file that passed step 3.

use crate::artefact::checksum::compute_sha256;
use crate::artefact::descriptor::ArtefactDescriptor;
use crate::artefact::download::{ArtefactFetcher, FetchOutcome, fetch_if_absent};
use crate::artefact::error::{ArtefactError, Disposition, Result};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::artefact::verification::{MismatchAction, verify_digest};
use crate::lock::ArtefactLock;
use crate::output::{fetch_message, write_stderr_line};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;

/// Settings for one orchestrator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnsureOptions {
    /// What to do with a file that fails verification.
    pub on_mismatch: MismatchAction,
    /// When true, suppress progress output.
    pub quiet: bool,
}

/// A file that passed checksum verification in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtefact {
    path: Utf8PathBuf,
    digest: Sha256Digest,
    outcome: FetchOutcome,
}

impl VerifiedArtefact {
    /// Path of the verified file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The digest the file was verified against.
    #[must_use]
    pub const fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Whether the file was downloaded in this run or already cached.
    #[must_use]
    pub const fn outcome(&self) -> FetchOutcome {
        self.outcome
    }
}

/// Ensure the described artefact is present and trusted.
///
/// Progress lines are written to `stderr` unless `options.quiet` is set.
///
/// # Errors
///
/// - [`ArtefactError::Io`] when the lock, checksum, or removal of an
///   untrusted file fails.
/// - [`ArtefactError::Fetch`] when the artefact was absent and could not be
///   downloaded.
/// - [`ArtefactError::Integrity`] when the file does not match the expected
///   digest. The file is no longer at the target path when this is returned.
pub fn ensure_artefact(
    descriptor: &ArtefactDescriptor,
    fetcher: &dyn ArtefactFetcher,
    options: &EnsureOptions,
    stderr: &mut dyn Write,
) -> Result<VerifiedArtefact> {
    let _lock = ArtefactLock::acquire(&descriptor.lock_path())?;
    let target = descriptor.target();

    if !options.quiet {
        write_stderr_line(stderr, format!("Ensuring artefact {target}..."));
    }
    let outcome = fetch_if_absent(fetcher, descriptor.source(), target.as_std_path())?;
    if !options.quiet {
        write_stderr_line(stderr, fetch_message(outcome, target));
    }

    let found = compute_sha256(target)?;
    let verification = verify_digest(found.as_str(), descriptor.expected());
    log::debug!("{target}: {verification}");

    if verification.is_match() {
        if !options.quiet {
            write_stderr_line(stderr, format!("Verified {target} ({found})."));
        }
        return Ok(VerifiedArtefact {
            path: target.to_owned(),
            digest: found,
            outcome,
        });
    }

    let disposition = discard_untrusted(descriptor, options.on_mismatch)?;
    log::warn!(
        "{target} failed integrity verification (expected {}, found {found}); file {disposition}",
        descriptor.expected()
    );
    if !options.quiet {
        write_stderr_line(
            stderr,
            format!("Integrity check failed for {target}; file {disposition}."),
        );
    }
    Err(ArtefactError::Integrity {
        path: target.to_owned(),
        expected: descriptor.expected().to_owned(),
        found,
        disposition,
    })
}

/// Move an untrusted file off the target path.
///
/// A quarantine that cannot be completed falls back to deletion, so the
/// target path is empty whenever this returns `Ok`.
fn discard_untrusted(
    descriptor: &ArtefactDescriptor,
    action: MismatchAction,
) -> Result<Disposition> {
    let target = descriptor.target();
    if action == MismatchAction::Quarantine {
        let to = descriptor.quarantine_path();
        if let Err(e) = fs::rename(target, &to) {
            log::warn!("could not quarantine {target} to {to}: {e}; deleting it instead");
            return delete_untrusted(target);
        }
        return Ok(Disposition::Quarantined { to });
    }
    delete_untrusted(target)
}

fn delete_untrusted(target: &Utf8Path) -> Result<Disposition> {
    fs::remove_file(target).map_err(|e| ArtefactError::io(target, e))?;
    Ok(Disposition::Deleted)
}

#[cfg(test)]
#[path = "ensure_tests.rs"]
mod tests;
