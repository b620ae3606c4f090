//! Declaration of the news-headlines units.
//!
//! [`compose`] declares every unit with its outputs and inputs, wires the
//! dependency edges explicitly, and validates the result as a
//! [`DependencyGraph`]. Each unit also carries a settings map that the plan
//! renders for the provisioning engine.
//!
//! The upload unit only accepts a [`VerifiedArtefact`], so a plan can never
//! bind a file that failed its checksum.

use crate::config::ResolvedConfig;
use crate::error::CompositionError;
use crate::pipeline_definition::{DATA_BUCKET_NAME_PARAMETER, PipelineDefinition};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::{Map, Value, json};
use stackyard_common::{DependencyGraph, GraphBuilder, OutputRef, UnitHandle, UnitId, UnitSpec};
use stackyard_fetcher::ensure::VerifiedArtefact;
use std::collections::BTreeMap;

/// Unit identifiers.
pub mod units {
    /// Versioned bucket holding training data and approvals.
    pub const DATA_BUCKET: &str = "DataBucketStack";
    /// Upload of the training data into the bucket.
    pub const DATA_UPLOAD: &str = "DataUploadStack";
    /// Notebook domain and execution role.
    pub const SAGEMAKER_SETUP: &str = "SagemakerSetupStack";
    /// Model training pipeline.
    pub const MODEL_PIPELINE: &str = "SagemakerModelPipelineStack";
    /// Functions driving model deployment.
    pub const DEPLOYMENT_LAMBDAS: &str = "DeploymentPipelineLambdasStack";
    /// Release pipeline reacting to approved models.
    pub const DEPLOYMENT_PIPELINE: &str = "DeploymentPipelineStack";
    /// Event rule for model approvals.
    pub const DEPLOYMENT_TRIGGER: &str = "DeploymentPipelineTriggerStack";
    /// Containerised inference front end.
    pub const ECS_APPLICATION: &str = "EcsApplicationStack";
}

/// Output names.
pub mod outputs {
    /// The data bucket.
    pub const DATA_BUCKET: &str = "dataBucket";
    /// The notebook domain.
    pub const DOMAIN: &str = "domain";
    /// Role assumed by notebooks and endpoints.
    pub const EXECUTION_ROLE: &str = "executionRole";
    /// The model training pipeline.
    pub const MODEL_PIPELINE: &str = "modelPipeline";
    /// Function reacting to model approval.
    pub const TRIGGER_MODEL_DEPLOY: &str = "triggerModelDeploy";
    /// Function deploying the approved model.
    pub const CREATE_OR_UPDATE_ENDPOINT: &str = "createOrUpdateEndpoint";
    /// Source artefact of the release pipeline.
    pub const SOURCE_OUTPUT: &str = "sourceOutput";
    /// Public address of the inference service.
    pub const SERVICE_URL: &str = "serviceUrl";
}

const DOMAIN_NAME: &str = "news-headlines";
const MODEL_PACKAGE_GROUP: &str = "news-headlines";
const PIPELINE_NAME: &str = "NEWS-HEADLINES-PIPELINE";
const APPROVED_MODEL_KEY: &str = "approved-model.json";
const LAMBDA_RUNTIME: &str = "python3.9";
const LAMBDA_MEMORY_MB: u32 = 128;
const APPLICATION_PORT: u16 = 80;

/// Per-unit settings rendered into the plan.
pub type Settings = Map<String, Value>;

/// Binding of a verified local file to a bucket destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketUpload {
    source: Utf8PathBuf,
    digest: String,
    destination: OutputRef,
    key_prefix: String,
}

impl BucketUpload {
    fn new(artefact: &VerifiedArtefact, destination: OutputRef, key_prefix: &str) -> Self {
        Self {
            source: artefact.path().to_path_buf(),
            digest: artefact.digest().as_str().to_owned(),
            destination,
            key_prefix: key_prefix.to_owned(),
        }
    }

    /// Local path of the verified file.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// SHA-256 the file was verified against.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Bucket output the file is uploaded into.
    #[must_use]
    pub const fn destination(&self) -> &OutputRef {
        &self.destination
    }

    /// Key prefix within the bucket.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}

/// The validated declaration of every unit.
#[derive(Debug)]
pub struct Composition {
    account: String,
    region: String,
    graph: DependencyGraph,
    settings: BTreeMap<UnitId, Settings>,
    upload: BucketUpload,
}

impl Composition {
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

    /// The validated dependency graph.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Settings declared for `id`.
    #[must_use]
    pub fn settings(&self, id: &UnitId) -> Option<&Settings> {
        self.settings.get(id)
    }

    /// The training-data upload.
    #[must_use]
    pub const fn upload(&self) -> &BucketUpload {
        &self.upload
    }
}

/// Collects units and their settings while the graph is being declared.
#[derive(Default)]
struct Declarations {
    builder: GraphBuilder,
    settings: BTreeMap<UnitId, Settings>,
}

impl Declarations {
    fn declare(&mut self, spec: UnitSpec, settings: Value) -> Result<UnitHandle, CompositionError> {
        let handle = self.builder.add_unit(spec)?;
        let settings = match settings {
            Value::Object(map) => map,
            _ => Settings::new(),
        };
        self.settings.insert(handle.id().clone(), settings);
        Ok(handle)
    }

    fn depends_on(
        &mut self,
        dependent: &UnitHandle,
        prerequisites: &[&UnitHandle],
    ) -> Result<(), CompositionError> {
        for prerequisite in prerequisites {
            self.builder.depends_on(dependent, prerequisite)?;
        }
        Ok(())
    }
}

/// Placeholder the provisioning engine replaces with the output's value.
fn reference(output: &OutputRef) -> String {
    format!("${{{output}}}")
}

/// Declares the news-headlines units and validates their dependencies.
///
/// `pipeline`, when given, has its data bucket parameter pointed at the
/// bucket output and is embedded in the model pipeline unit's settings.
///
/// # Errors
///
/// Returns [`CompositionError::MissingParameter`] when `pipeline` lacks the
/// data bucket parameter, and [`CompositionError::Graph`] when the
/// declarations do not form a valid graph.
pub fn compose(
    config: &ResolvedConfig,
    artefact: &VerifiedArtefact,
    pipeline: Option<PipelineDefinition>,
) -> Result<Composition, CompositionError> {
    let mut decl = Declarations::default();

    let bucket = decl.declare(
        UnitSpec::new(units::DATA_BUCKET).with_output(outputs::DATA_BUCKET),
        json!({ "versioned": true }),
    )?;
    let data_bucket = bucket.output(outputs::DATA_BUCKET)?;

    let upload = decl.declare(
        UnitSpec::new(units::DATA_UPLOAD).with_input(data_bucket.clone()),
        json!({ "destinationKeyPrefix": config.key_prefix() }),
    )?;
    decl.depends_on(&upload, &[&bucket])?;

    let setup = decl.declare(
        UnitSpec::new(units::SAGEMAKER_SETUP)
            .with_output(outputs::DOMAIN)
            .with_output(outputs::EXECUTION_ROLE)
            .with_input(data_bucket.clone()),
        json!({
            "domainName": DOMAIN_NAME,
            "authMode": "IAM",
            "userProfiles": ["myuser"],
            "managedPolicies": ["AmazonSageMakerFullAccess"],
        }),
    )?;
    decl.depends_on(&setup, &[&bucket])?;
    let execution_role = setup.output(outputs::EXECUTION_ROLE)?;

    let model_pipeline = decl.declare(
        UnitSpec::new(units::MODEL_PIPELINE)
            .with_output(outputs::MODEL_PIPELINE)
            .with_input(data_bucket.clone()),
        model_pipeline_settings(&data_bucket, pipeline)?,
    )?;
    decl.depends_on(&model_pipeline, &[&bucket, &upload, &setup])?;

    let lambdas = decl.declare(
        UnitSpec::new(units::DEPLOYMENT_LAMBDAS)
            .with_output(outputs::TRIGGER_MODEL_DEPLOY)
            .with_output(outputs::CREATE_OR_UPDATE_ENDPOINT)
            .with_input(data_bucket.clone())
            .with_input(execution_role.clone()),
        lambda_settings(&data_bucket, &execution_role),
    )?;
    decl.depends_on(&lambdas, &[&bucket, &setup])?;
    let trigger_model_deploy = lambdas.output(outputs::TRIGGER_MODEL_DEPLOY)?;
    let create_or_update_endpoint = lambdas.output(outputs::CREATE_OR_UPDATE_ENDPOINT)?;

    let release = decl.declare(
        UnitSpec::new(units::DEPLOYMENT_PIPELINE)
            .with_output(outputs::SOURCE_OUTPUT)
            .with_input(data_bucket.clone())
            .with_input(create_or_update_endpoint.clone()),
        json!({
            "stages": [
                {
                    "name": "Source",
                    "action": format!("ON-CHANGE-{APPROVED_MODEL_KEY}"),
                    "bucketKey": APPROVED_MODEL_KEY,
                },
                {
                    "name": "Deploy",
                    "action": "CreateOrUpdateSagemakerEndpoint",
                    "function": reference(&create_or_update_endpoint),
                },
            ],
        }),
    )?;
    decl.depends_on(&release, &[&bucket, &lambdas])?;

    let trigger = decl.declare(
        UnitSpec::new(units::DEPLOYMENT_TRIGGER).with_input(trigger_model_deploy.clone()),
        json!({
            "ruleName": "ModelPackageStateChangeRule",
            "eventPattern": {
                "detail-type": ["SageMaker Model Package State Change"],
                "source": ["aws.sagemaker"],
                "detail": {
                    "ModelPackageGroupName": [MODEL_PACKAGE_GROUP],
                    "ModelApprovalStatus": ["Approved"],
                },
            },
            "target": reference(&trigger_model_deploy),
        }),
    )?;
    decl.depends_on(&trigger, &[&lambdas])?;

    decl.declare(
        UnitSpec::new(units::ECS_APPLICATION).with_output(outputs::SERVICE_URL),
        json!({
            "port": APPLICATION_PORT,
            "cpu": 256,
            "memoryLimitMiB": 512,
            "desiredCount": 2,
            "logGroupName": "EcsApplicationLogs",
            "taskPolicyActions": ["sagemaker:InvokeEndpoint"],
        }),
    )?;

    let graph = decl.builder.build()?;
    log::debug!("composed {} units", graph.len());

    Ok(Composition {
        account: config.account().to_owned(),
        region: config.region().to_owned(),
        graph,
        settings: decl.settings,
        upload: BucketUpload::new(artefact, data_bucket, config.key_prefix()),
    })
}

fn model_pipeline_settings(
    data_bucket: &OutputRef,
    pipeline: Option<PipelineDefinition>,
) -> Result<Value, CompositionError> {
    let mut settings = json!({
        "pipelineName": PIPELINE_NAME,
        "managedPolicies": ["AmazonSageMakerFullAccess"],
    });
    if let Some(mut definition) = pipeline {
        definition.inject_parameter(DATA_BUCKET_NAME_PARAMETER, &reference(data_bucket))?;
        if let Some(map) = settings.as_object_mut() {
            map.insert(
                "pipelineDefinitionBody".to_owned(),
                Value::String(definition.as_json().to_string()),
            );
        }
    }
    Ok(settings)
}

fn lambda_settings(data_bucket: &OutputRef, execution_role: &OutputRef) -> Value {
    json!({
        "runtime": LAMBDA_RUNTIME,
        "memorySize": LAMBDA_MEMORY_MB,
        "functions": {
            "triggerModelDeploy": {
                "handler": "trigger_model_deploy.lambda_handler",
                "timeoutSeconds": 3 * 60,
                "environment": { "BUCKET_NAME": reference(data_bucket) },
            },
            "createOrUpdateEndpoint": {
                "handler": "create_or_update_endpoint.lambda_handler",
                "timeoutSeconds": 7 * 60,
                "environment": { "EXECUTION_ROLE_ARN": reference(execution_role) },
            },
        },
    })
}

#[cfg(test)]
#[path = "composition_tests.rs"]
mod tests;
