//! Stackyard artefact fetcher library.
//!
//! This crate ensures that externally sourced files are present on disk and
//! trusted before anything downstream consumes them. A file is fetched only
//! when it is absent, but it is checksummed and verified on every run; a file
//! that fails verification is removed from its cached location.
//!
//! # Modules
//!
//! - [`artefact`] - Descriptors, checksums, downloads, and digest comparison
//! - [`ensure`] - The fetch-verify orchestrator
//! - [`lock`] - Advisory lock serialising runs against one target path
//! - [`output`] - Progress reporting helpers

pub mod artefact;
pub mod ensure;
pub mod lock;
pub mod output;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
