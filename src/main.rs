//! Stackyard CLI entrypoint.
//!
//! Loads configuration, ensures the training-data artefact, and either
//! reports the verified path or prints the provisioning plan.

use camino::Utf8Path;
use clap::Parser;
use stackyard::cli::{Cli, Command, CommonArgs};
use stackyard::config::{Environment, ProvisionConfig, ResolvedConfig};
use stackyard::dirs::SystemBaseDirs;
use stackyard::error::{Result, StackyardError};
use stackyard::workflow;
use stackyard_fetcher::artefact::download::HttpFetcher;
use stackyard_fetcher::output::write_stderr_line;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let env = Environment::from_process();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &env, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, env: &Environment, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let common = cli.command.common();
    let config = load_config(common, env)?;
    let fetcher = HttpFetcher::new(config.fetch_timeout());

    match &cli.command {
        Command::Fetch(_) => {
            let verified = workflow::fetch(&config, &fetcher, common.quiet, stderr)?;
            write_line(stdout, "stdout", verified.path())
        }
        Command::Plan(args) => {
            let plan = workflow::plan(&config, &fetcher, common.quiet, stderr)?;
            let rendered = plan.to_json()?;
            match &args.output {
                Some(path) => write_plan_file(path, &rendered, common.quiet, stderr),
                None => write_line(stdout, "stdout", rendered),
            }
        }
    }
}

fn load_config(common: &CommonArgs, env: &Environment) -> Result<ResolvedConfig> {
    let (path, explicit) = common.config_path();
    let file = if explicit {
        ProvisionConfig::load(path)?
    } else {
        ProvisionConfig::load_or_default(path)?
    };
    Ok(file.resolve(env, &SystemBaseDirs)?)
}

fn write_plan_file(
    path: &Utf8Path,
    rendered: &str,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<()> {
    std::fs::write(path, format!("{rendered}\n")).map_err(|source| StackyardError::Output {
        target: path.to_string(),
        source,
    })?;
    if !quiet {
        write_stderr_line(stderr, format!("Plan written to {path}"));
    }
    Ok(())
}

fn write_line(out: &mut dyn Write, target: &str, message: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{message}").map_err(|source| StackyardError::Output {
        target: target.to_owned(),
        source,
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackyard::error::ConfigError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = StackyardError::from(ConfigError::MissingSetting {
            name: "account",
            env_var: "CDK_DEFAULT_ACCOUNT",
        });

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: missing setting `account`"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let temp = tempfile::tempdir().expect("temp dir");
        let missing = camino::Utf8PathBuf::try_from(temp.path().join("missing.toml"))
            .expect("UTF-8 path");
        let cli = Cli::parse_from(["stackyard", "fetch", "--config", missing.as_str()]);
        let env = Environment {
            account: Some("1".to_owned()),
            region: Some("r".to_owned()),
        };

        let err = run(&cli, &env, &mut Vec::new(), &mut Vec::new()).expect_err("missing file");
        assert!(
            matches!(err, StackyardError::Config(ConfigError::Read { .. })),
            "got {err:?}"
        );
    }

    #[test]
    fn unresolved_account_fails_before_any_download() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = camino::Utf8PathBuf::try_from(temp.path().join("stackyard.toml"))
            .expect("UTF-8 path");
        std::fs::write(&path, "region = \"us-east-1\"\n").expect("write config");
        let cli = Cli::parse_from(["stackyard", "plan", "--config", path.as_str()]);

        let err = run(&cli, &Environment::default(), &mut Vec::new(), &mut Vec::new())
            .expect_err("account missing");
        assert!(
            matches!(
                err,
                StackyardError::Config(ConfigError::MissingSetting {
                    name: "account",
                    ..
                })
            ),
            "got {err:?}"
        );
    }
}
