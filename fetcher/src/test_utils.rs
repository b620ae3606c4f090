//! Shared test utilities for the fetcher crate.

use crate::artefact::download::{ArtefactFetcher, FetchError};
use crate::artefact::checksum::sha256_bytes;
use std::cell::{Cell, RefCell};
use std::path::Path;

/// Returns the lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    sha256_bytes(data).to_string()
}

/// A fetcher that serves a fixed body and records every call.
///
/// The body can be swapped between runs to simulate a corrected or a
/// tampered upstream.
#[derive(Debug)]
pub struct StubFetcher {
    body: RefCell<Vec<u8>>,
    calls: Cell<usize>,
}

impl StubFetcher {
    /// Creates a fetcher serving `body`.
    #[must_use]
    pub fn serving(body: &[u8]) -> Self {
        Self {
            body: RefCell::new(body.to_vec()),
            calls: Cell::new(0),
        }
    }

    /// Replaces the body served by later calls.
    pub fn set_body(&self, body: &[u8]) {
        *self.body.borrow_mut() = body.to_vec();
    }

    /// Number of times [`ArtefactFetcher::fetch`] was invoked.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ArtefactFetcher for StubFetcher {
    fn fetch(&self, _source: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.set(self.calls.get() + 1);
        std::fs::write(dest, self.body.borrow().as_slice()).map_err(FetchError::Io)
    }
}

/// A fetcher whose every call fails with the error built by `make_error`.
pub struct FailingFetcher {
    make_error: fn(&str) -> FetchError,
    calls: Cell<usize>,
}

impl FailingFetcher {
    /// Creates a fetcher failing with `make_error(source)`.
    #[must_use]
    pub const fn new(make_error: fn(&str) -> FetchError) -> Self {
        Self {
            make_error,
            calls: Cell::new(0),
        }
    }

    /// A fetcher that reports HTTP 404.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(|url| FetchError::NotFound {
            url: url.to_owned(),
        })
    }

    /// A fetcher that reports a transport failure.
    #[must_use]
    pub fn connection_refused() -> Self {
        Self::new(|url| FetchError::Http {
            url: url.to_owned(),
            reason: "connection refused".to_owned(),
        })
    }

    /// Number of times [`ArtefactFetcher::fetch`] was invoked.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ArtefactFetcher for FailingFetcher {
    fn fetch(&self, source: &str, _dest: &Path) -> Result<(), FetchError> {
        self.calls.set(self.calls.get() + 1);
        Err((self.make_error)(source))
    }
}
