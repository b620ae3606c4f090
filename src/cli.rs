//! CLI argument definitions for stackyard.
//!
//! Kept apart from the entrypoint so the binary stays focused on
//! orchestration and the parser can be tested directly.

use crate::config::DEFAULT_CONFIG_FILE;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};

/// Declare the news-headlines infrastructure and emit a verified plan.
#[derive(Parser, Debug)]
#[command(name = "stackyard")]
#[command(version, about)]
#[command(long_about = concat!(
    "Declare the news-headlines infrastructure and emit a verified plan.\n\n",
    "Before any unit is composed, the training-data artefact is fetched into the ",
    "local cache if absent and its SHA-256 checked on every run. A file that ",
    "fails the check is removed from the cache and the run stops.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Make sure the training data is cached and trusted:\n",
    "    $ stackyard fetch\n\n",
    "  Write the provisioning plan to a file:\n",
    "    $ stackyard plan --output plan.json\n\n",
    "Account and region fall back to CDK_DEFAULT_ACCOUNT and CDK_DEFAULT_REGION.",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ensure the training data is present and trusted.
    Fetch(FetchArgs),

    /// Ensure the training data, compose the units and render the plan.
    Plan(PlanArgs),
}

impl Command {
    /// Arguments shared by every subcommand.
    #[must_use]
    pub const fn common(&self) -> &CommonArgs {
        match self {
            Self::Fetch(args) => &args.common,
            Self::Plan(args) => &args.common,
        }
    }
}

/// Arguments accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file [default: stackyard.toml, optional].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl CommonArgs {
    /// The configuration path and whether it was named explicitly.
    ///
    /// An explicitly named file must exist; the default one may be absent.
    #[must_use]
    pub fn config_path(&self) -> (&Utf8Path, bool) {
        self.config
            .as_deref()
            .map_or((Utf8Path::new(DEFAULT_CONFIG_FILE), false), |path| (path, true))
    }
}

/// Arguments for the fetch command.
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the plan command.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Shared arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Write the plan here instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,
}
