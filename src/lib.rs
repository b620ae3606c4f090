//! Stackyard declares the news-headlines infrastructure units and hands a
//! validated, ordered plan to an external provisioning engine.
//!
//! A run always starts by making sure the training-data artefact is present
//! and matches its published SHA-256; only then are the units composed.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`composition`] - Unit declarations and their dependency edges
//! - [`config`] - `stackyard.toml` loading and environment fallbacks
//! - [`dirs`] - Platform directory lookup
//! - [`error`] - Error types for each stage of a run
//! - [`pipeline_definition`] - Parameter injection into pipeline documents
//! - [`plan`] - Serialisable provisioning plan
//! - [`workflow`] - The fetch and plan workflows

pub mod cli;
pub mod composition;
pub mod config;
pub mod dirs;
pub mod error;
pub mod pipeline_definition;
pub mod plan;
pub mod workflow;

pub use config::{Environment, ProvisionConfig, ResolvedConfig};
pub use error::{Result, StackyardError};
