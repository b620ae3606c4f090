//! Artefact download logic.
//!
//! Provides a trait-based abstraction for retrieving a remote resource into
//! a local file, enabling dependency injection for testing, and the
//! fetch-if-absent rule the orchestrator relies on.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Network timeout applied to every request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for retrieving the bytes addressed by a URI into a local file.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
#[cfg_attr(any(test, feature = "test-support"), mockall::automock)]
pub trait ArtefactFetcher {
    /// Retrieve `source` and write its body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success response, or a
    /// failed write.
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Errors arising from artefact fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request failed or returned a non-success status.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a fetch-if-absent call touched the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A file was already at the target path; nothing was fetched.
    AlreadyPresent,
    /// The file was absent and has been downloaded.
    Downloaded,
}

/// Ensure a file exists at `dest`, fetching `source` only when it is absent.
///
/// Presence is treated as sufficient here: the existing content is not
/// inspected. Verification is the orchestrator's job.
///
/// # Errors
///
/// Returns [`FetchError::Io`] if existence cannot be determined, or any
/// error raised by `fetcher`.
pub fn fetch_if_absent(
    fetcher: &dyn ArtefactFetcher,
    source: &str,
    dest: &Path,
) -> Result<FetchOutcome, FetchError> {
    if dest.try_exists()? {
        log::debug!("{} already present; skipping fetch", dest.display());
        return Ok(FetchOutcome::AlreadyPresent);
    }
    log::debug!("fetching {source} into {}", dest.display());
    fetcher.fetch(source, dest)?;
    Ok(FetchOutcome::Downloaded)
}

/// HTTP-based fetcher using `ureq`.
///
/// The body is streamed into a temporary file beside `dest` and renamed
/// onto `dest` only once fully written.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ArtefactFetcher for HttpFetcher {
    fn fetch(&self, source: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self
            .agent
            .get(source)
            .call()
            .map_err(|e| map_ureq_error(source, &e))?;
        let mut body = response.into_body();
        write_atomically(dest, |file| {
            std::io::copy(&mut body.as_reader(), file).map(|_| ())
        })
    }
}

/// Write through `fill` into a temporary sibling of `dest`, then rename it
/// onto `dest`.
///
/// On failure the temporary file is removed and `dest` is untouched.
fn write_atomically(
    dest: &Path,
    fill: impl FnOnce(&mut std::fs::File) -> std::io::Result<()>,
) -> Result<(), FetchError> {
    let parent = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    fill(staged.as_file_mut())?;
    staged.as_file_mut().flush()?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|e| FetchError::Io(e.error))?;
    Ok(())
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
