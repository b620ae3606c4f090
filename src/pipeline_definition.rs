//! Model pipeline definition documents.
//!
//! The pipeline definition is produced by a separate authoring step as JSON.
//! Its top-level `Parameters` array declares named inputs; composition sets the
//! `DefaultValue` of the data bucket parameter so the pipeline reads from the
//! bucket declared alongside it.

use crate::error::CompositionError;
use camino::Utf8Path;
use serde_json::Value;

/// Parameter receiving the data bucket reference.
pub const DATA_BUCKET_NAME_PARAMETER: &str = "DataBucketName";

/// A parsed pipeline definition.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineDefinition {
    document: Value,
}

impl PipelineDefinition {
    /// Parses a definition from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::InvalidDefinition`] when the text is not
    /// JSON or its top level is not an object.
    pub fn from_json(text: &str) -> Result<Self, CompositionError> {
        let document: Value =
            serde_json::from_str(text).map_err(|err| CompositionError::InvalidDefinition {
                reason: err.to_string(),
            })?;
        if !document.is_object() {
            return Err(CompositionError::InvalidDefinition {
                reason: "top level must be a JSON object".to_owned(),
            });
        }
        Ok(Self { document })
    }

    /// Reads and parses a definition file.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::ReadDefinition`] when the file cannot be
    /// read, otherwise as [`Self::from_json`].
    pub fn load(path: &Utf8Path) -> Result<Self, CompositionError> {
        let text =
            std::fs::read_to_string(path).map_err(|source| CompositionError::ReadDefinition {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&text)
    }

    /// Sets `DefaultValue` on every parameter named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::MissingParameter`] when no entry of the
    /// `Parameters` array has a matching `Name`. The document is unchanged in
    /// that case.
    pub fn inject_parameter(&mut self, name: &str, value: &str) -> Result<(), CompositionError> {
        let mut found = false;
        let parameters = self
            .document
            .get_mut("Parameters")
            .and_then(Value::as_array_mut)
            .into_iter()
            .flatten();
        for parameter in parameters {
            if parameter.get("Name").and_then(Value::as_str) != Some(name) {
                continue;
            }
            if let Some(entry) = parameter.as_object_mut() {
                entry.insert("DefaultValue".to_owned(), Value::String(value.to_owned()));
                found = true;
            }
        }

        if found {
            log::debug!("injected {name} into pipeline definition");
            Ok(())
        } else {
            Err(CompositionError::MissingParameter {
                name: name.to_owned(),
            })
        }
    }

    /// Current `DefaultValue` of the parameter named `name`.
    #[must_use]
    pub fn parameter_default(&self, name: &str) -> Option<&str> {
        self.document
            .get("Parameters")?
            .as_array()?
            .iter()
            .find(|parameter| parameter.get("Name").and_then(Value::as_str) == Some(name))?
            .get("DefaultValue")?
            .as_str()
    }

    /// The document as JSON.
    #[must_use]
    pub const fn as_json(&self) -> &Value {
        &self.document
    }
}
