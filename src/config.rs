//! Provisioning configuration.
//!
//! Settings live in `stackyard.toml`, deserialised with `serde` and `toml`
//! into [`ProvisionConfig`]. Every field is optional in the file and falls
//! back to the defaults below. Account and region may instead come from the
//! `CDK_DEFAULT_ACCOUNT` and `CDK_DEFAULT_REGION` variables; `main` reads those
//! once into an [`Environment`] and [`ProvisionConfig::resolve`] merges the
//! two sources into a [`ResolvedConfig`] that the rest of the run consumes.

use crate::dirs::BaseDirs;
use crate::error::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use stackyard_fetcher::artefact::descriptor::ArtefactDescriptor;
use stackyard_fetcher::artefact::verification::MismatchAction;
use stackyard_fetcher::ensure::EnsureOptions;
use std::io::ErrorKind;
use std::time::Duration;

/// File consulted when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "stackyard.toml";
/// Environment variable supplying the account when the file omits it.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
/// Environment variable supplying the region when the file omits it.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Location of the sentiment training data.
pub const DEFAULT_ARTEFACT_URL: &str = "https://static.us-east-1.prod.workshops.aws/public/40de25f9-f9de-4fba-8871-0bf4761d175e/static/resources/finserv/sentiment.zip";
/// Published SHA-256 of [`DEFAULT_ARTEFACT_URL`].
pub const DEFAULT_ARTEFACT_SHA256: &str =
    "784cd852f324670fe324a65dc52a67d1f72d05f87677c0f487517b45fc1adc2d";
/// Cached file name of the training data.
pub const DEFAULT_FILE_NAME: &str = "sentiment.zip";
/// Key prefix the training data is uploaded under.
pub const DEFAULT_KEY_PREFIX: &str = "raw";

/// Configuration as written in `stackyard.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Target account. Falls back to `CDK_DEFAULT_ACCOUNT`.
    pub account: Option<String>,
    /// Target region. Falls back to `CDK_DEFAULT_REGION`.
    pub region: Option<String>,
    /// Pipeline definition document to inject the bucket name into.
    ///
    /// When absent the model pipeline unit is declared without a definition
    /// body.
    pub pipeline_definition: Option<Utf8PathBuf>,
    /// The training-data artefact.
    pub artefact: ArtefactConfig,
}

/// Settings for the artefact fetched before composition.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ArtefactConfig {
    /// Source URI.
    pub url: String,
    /// Expected SHA-256, hex encoded.
    pub sha256: String,
    /// File name within the cache directory.
    pub file_name: String,
    /// Cache directory. Defaults to the platform cache directory.
    pub cache_dir: Option<Utf8PathBuf>,
    /// Key prefix for the bucket upload.
    pub key_prefix: String,
    /// What to do with a file that fails verification.
    pub on_mismatch: MismatchAction,
    /// Whole-request download timeout in seconds.
    #[serde(default = "ArtefactConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ArtefactConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for ArtefactConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ARTEFACT_URL.to_owned(),
            sha256: DEFAULT_ARTEFACT_SHA256.to_owned(),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            cache_dir: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            on_mismatch: MismatchAction::default(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Process environment values consulted during resolution.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Environment {
    /// Value of `CDK_DEFAULT_ACCOUNT`.
    pub account: Option<String>,
    /// Value of `CDK_DEFAULT_REGION`.
    pub region: Option<String>,
}

impl Environment {
    /// Reads the fallback variables from the current process.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            account: std::env::var(ACCOUNT_ENV).ok(),
            region: std::env::var(REGION_ENV).ok(),
        }
    }
}

impl ProvisionConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, wrongly typed values
    /// or unknown keys. `origin` is used in the message.
    pub fn from_toml(source: &str, origin: &Utf8Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Parse {
            path: origin.to_path_buf(),
            source: Box::new(err),
        })
    }

    /// Loads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source, path)
    }

    /// Loads configuration from `path`, using defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// As [`Self::load`], except that a missing file is not an error.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                log::debug!("no configuration at {path}; using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Merges the environment and platform directories into a complete
    /// configuration.
    ///
    /// Values in the file win over the environment. Blank values count as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] when account or region is
    /// absent from both sources, and [`ConfigError::CacheDir`] when no cache
    /// directory is configured and the platform offers no usable one.
    pub fn resolve(
        self,
        env: &Environment,
        dirs: &dyn BaseDirs,
    ) -> Result<ResolvedConfig, ConfigError> {
        let account = pick(self.account.as_deref(), env.account.as_deref())
            .ok_or_else(|| missing("account", ACCOUNT_ENV))?;
        let region = pick(self.region.as_deref(), env.region.as_deref())
            .ok_or_else(|| missing("region", REGION_ENV))?;
        let cache_dir = self
            .artefact
            .cache_dir
            .clone()
            .map_or_else(|| platform_cache_dir(dirs), Ok)?;

        Ok(ResolvedConfig {
            account,
            region,
            pipeline_definition: self.pipeline_definition,
            cache_dir,
            artefact: self.artefact,
        })
    }
}

fn normalise(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|candidate| !candidate.is_empty())
}

fn pick(file: Option<&str>, env: Option<&str>) -> Option<String> {
    normalise(file)
        .or_else(|| normalise(env))
        .map(str::to_owned)
}

const fn missing(name: &'static str, env_var: &'static str) -> ConfigError {
    ConfigError::MissingSetting { name, env_var }
}

fn platform_cache_dir(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf, ConfigError> {
    let dir = dirs.cache_dir().ok_or_else(|| ConfigError::CacheDir {
        reason: "the platform defines no cache directory".to_owned(),
    })?;
    Utf8PathBuf::from_path_buf(dir).map_err(|path| ConfigError::CacheDir {
        reason: format!("{} is not valid UTF-8", path.display()),
    })
}

/// Configuration with every fallback applied.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedConfig {
    account: String,
    region: String,
    pipeline_definition: Option<Utf8PathBuf>,
    cache_dir: Utf8PathBuf,
    artefact: ArtefactConfig,
}

impl ResolvedConfig {
    /// Target account.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Target region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Pipeline definition path, if configured.
    #[must_use]
    pub fn pipeline_definition(&self) -> Option<&Utf8Path> {
        self.pipeline_definition.as_deref()
    }

    /// Directory holding the cached artefact.
    #[must_use]
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Key prefix for the bucket upload.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.artefact.key_prefix
    }

    /// Describes the artefact to fetch and verify.
    #[must_use]
    pub fn descriptor(&self) -> ArtefactDescriptor {
        ArtefactDescriptor::new(
            self.artefact.url.as_str(),
            self.cache_dir.join(&self.artefact.file_name),
            self.artefact.sha256.as_str(),
        )
    }

    /// Orchestrator settings for this configuration.
    #[must_use]
    pub const fn ensure_options(&self, quiet: bool) -> EnsureOptions {
        EnsureOptions {
            on_mismatch: self.artefact.on_mismatch,
            quiet,
        }
    }

    /// Download timeout.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.artefact.timeout_secs)
    }
}
