//! The fetch and plan workflows behind the CLI subcommands.
//!
//! Both start by ensuring the artefact; composition never runs unless the
//! artefact verified in the same run.

use crate::composition::compose;
use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::pipeline_definition::PipelineDefinition;
use crate::plan::Plan;
use stackyard_fetcher::artefact::download::ArtefactFetcher;
use stackyard_fetcher::ensure::{VerifiedArtefact, ensure_artefact};
use std::io::Write;

/// Ensures the configured artefact is present and trusted.
///
/// # Errors
///
/// Returns [`crate::error::StackyardError::Artefact`] when fetching or
/// verification fails.
pub fn fetch(
    config: &ResolvedConfig,
    fetcher: &dyn ArtefactFetcher,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<VerifiedArtefact> {
    let descriptor = config.descriptor();
    let verified = ensure_artefact(&descriptor, fetcher, &config.ensure_options(quiet), stderr)?;
    Ok(verified)
}

/// Ensures the artefact, composes every unit and renders the plan.
///
/// # Errors
///
/// Fails as [`fetch`] does, and with
/// [`crate::error::StackyardError::Composition`] when the pipeline
/// definition or the unit declarations are invalid.
pub fn plan(
    config: &ResolvedConfig,
    fetcher: &dyn ArtefactFetcher,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<Plan> {
    let artefact = fetch(config, fetcher, quiet, stderr)?;
    let pipeline = config
        .pipeline_definition()
        .map(PipelineDefinition::load)
        .transpose()?;
    let composition = compose(config, &artefact, pipeline)?;
    Ok(Plan::from_composition(&composition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArtefactConfig, Environment, ProvisionConfig};
    use crate::dirs::MockBaseDirs;
    use crate::error::StackyardError;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use stackyard_fetcher::artefact::download::MockArtefactFetcher;
    use stackyard_fetcher::artefact::error::ArtefactError;
    use stackyard_fetcher::test_utils::{StubFetcher, sha256_hex};

    struct Scratch {
        _temp: tempfile::TempDir,
        dir: Utf8PathBuf,
    }

    #[fixture]
    fn scratch() -> Scratch {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        Scratch { _temp: temp, dir }
    }

    fn resolved(
        scratch: &Scratch,
        sha256: String,
        pipeline: Option<Utf8PathBuf>,
    ) -> ResolvedConfig {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_cache_dir().never();
        ProvisionConfig {
            account: Some("123456789012".to_owned()),
            region: Some("us-east-1".to_owned()),
            pipeline_definition: pipeline,
            artefact: ArtefactConfig {
                cache_dir: Some(scratch.dir.join("data")),
                sha256,
                ..ArtefactConfig::default()
            },
        }
        .resolve(&Environment::default(), &dirs)
        .expect("resolve")
    }

    #[rstest]
    fn plan_embeds_the_verified_upload(scratch: Scratch) {
        let config = resolved(&scratch, sha256_hex(b"hello"), None);
        let fetcher = StubFetcher::serving(b"hello");

        let plan = plan(&config, &fetcher, true, &mut Vec::new()).expect("plan");

        let rendered = plan.to_json().expect("render");
        assert!(rendered.contains(&sha256_hex(b"hello")));
        assert!(rendered.contains("sentiment.zip"));
        assert_eq!(fetcher.calls(), 1);
    }

    #[rstest]
    fn integrity_failure_stops_before_composition(scratch: Scratch) {
        // A definition without the bucket parameter would fail composition;
        // the integrity error must win because composition never starts.
        let definition = scratch.dir.join("pipeline.json");
        std::fs::write(&definition, r#"{"Parameters": []}"#).expect("write definition");
        let config = resolved(&scratch, "deadbeef".to_owned(), Some(definition));

        let err = plan(&config, &StubFetcher::serving(b"hello"), true, &mut Vec::new())
            .expect_err("integrity failure");

        assert!(
            matches!(err, StackyardError::Artefact(ArtefactError::Integrity { .. })),
            "got {err:?}"
        );
        assert!(!config.descriptor().target().exists());
    }

    #[rstest]
    fn missing_pipeline_definition_is_reported(scratch: Scratch) {
        let config = resolved(
            &scratch,
            sha256_hex(b"hello"),
            Some(scratch.dir.join("absent.json")),
        );

        let err = plan(&config, &StubFetcher::serving(b"hello"), true, &mut Vec::new())
            .expect_err("definition missing");

        assert!(err.to_string().contains("absent.json"), "got {err}");
    }

    #[rstest]
    fn fetch_reuses_a_trusted_cache(scratch: Scratch) {
        let config = resolved(&scratch, sha256_hex(b"hello"), None);
        let target = config.descriptor().target().to_path_buf();
        std::fs::create_dir_all(target.parent().expect("parent")).expect("cache dir");
        std::fs::write(&target, b"hello").expect("seed cache");
        let mut fetcher = MockArtefactFetcher::new();
        fetcher.expect_fetch().never();

        let verified = fetch(&config, &fetcher, true, &mut Vec::new()).expect("verified");

        assert_eq!(verified.path(), target.as_path());
    }
}
