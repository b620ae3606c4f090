//! Artefact domain model: descriptors, digests, downloads, and verification.
//!
//! # Sub-modules
//!
//! - [`checksum`] - SHA-256 computation for local files.
//! - [`descriptor`] - The immutable `ArtefactDescriptor`.
//! - [`download`] - Fetcher trait, HTTP implementation, and fetch-if-absent.
//! - [`error`] - Error types for artefact operations.
//! - [`sha256_digest`] - Computed digest newtype (`Sha256Digest`).
//! - [`verification`] - Digest comparison and mismatch handling policy.

pub mod checksum;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod sha256_digest;
pub mod verification;
