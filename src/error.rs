//! Error types for the stackyard CLI and library.
//!
//! Each stage of a run has its own enum so callers can match on the failure
//! they care about; [`StackyardError`] gathers them for the binary, which
//! prints the message and exits with status 1.

use camino::Utf8PathBuf;
use stackyard_common::GraphError;
use stackyard_fetcher::artefact::error::ArtefactError;
use thiserror::Error;

/// Failures while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::ProvisionConfig`].
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A required setting is absent from both the file and the environment.
    #[error("missing setting `{name}`; set it in the configuration file or export {env_var}")]
    MissingSetting {
        /// Configuration key.
        name: &'static str,
        /// Environment variable consulted as a fallback.
        env_var: &'static str,
    },

    /// No cache directory was configured and none could be derived.
    #[error("could not determine an artefact cache directory: {reason}")]
    CacheDir {
        /// Why the platform directory was unusable.
        reason: String,
    },
}

/// Failures while declaring units or preparing their inputs.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// The declared units do not form a valid graph.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The pipeline definition file could not be read.
    #[error("failed to read pipeline definition {path}: {source}")]
    ReadDefinition {
        /// Path of the pipeline definition.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The pipeline definition is not a JSON object.
    #[error("invalid pipeline definition: {reason}")]
    InvalidDefinition {
        /// Parser diagnostic or shape problem.
        reason: String,
    },

    /// The pipeline definition lacks a parameter the composition injects.
    #[error("parameter with Name == {name} not in pipeline definition")]
    MissingParameter {
        /// Name of the missing parameter.
        name: String,
    },
}

/// Top-level error for a stackyard run.
#[derive(Debug, Error)]
pub enum StackyardError {
    /// Configuration could not be loaded or resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The artefact could not be fetched or failed verification.
    #[error(transparent)]
    Artefact(#[from] ArtefactError),

    /// The units could not be composed.
    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// The plan could not be serialised.
    #[error("failed to render plan: {0}")]
    Render(#[from] serde_json::Error),

    /// The plan or verified path could not be written.
    #[error("failed to write {target}: {source}")]
    Output {
        /// Where the output was going.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<GraphError> for StackyardError {
    fn from(err: GraphError) -> Self {
        Self::Composition(CompositionError::Graph(err))
    }
}

/// Convenience alias for stackyard results.
pub type Result<T, E = StackyardError> = std::result::Result<T, E>;
