//! Rendering a composition into a provisioning plan.
//!
//! The plan is the hand-off document for the external provisioning engine:
//! units appear in materialisation order with their prerequisites, so the
//! engine can create them front to back.

use crate::composition::{BucketUpload, Composition, Settings};
use serde::Serialize;
use stackyard_common::{OutputRef, UnitId};

/// A serialisable provisioning plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    account: String,
    region: String,
    units: Vec<PlannedUnit>,
    upload: BucketUpload,
}

/// One unit in a [`Plan`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedUnit {
    id: UnitId,
    prerequisites: Vec<UnitId>,
    inputs: Vec<OutputRef>,
    outputs: Vec<String>,
    settings: Settings,
}

impl PlannedUnit {
    /// The unit identifier.
    #[must_use]
    pub const fn id(&self) -> &UnitId {
        &self.id
    }

    /// Units that must be materialised first.
    #[must_use]
    pub fn prerequisites(&self) -> &[UnitId] {
        &self.prerequisites
    }
}

impl Plan {
    /// Builds the plan for `composition`.
    #[must_use]
    pub fn from_composition(composition: &Composition) -> Self {
        let graph = composition.graph();
        let units = graph
            .materialisation_order()
            .map(|unit| PlannedUnit {
                id: unit.id().clone(),
                prerequisites: graph.prerequisites(unit.id()).cloned().collect(),
                inputs: unit.inputs().to_vec(),
                outputs: unit.outputs().iter().cloned().collect(),
                settings: composition.settings(unit.id()).cloned().unwrap_or_default(),
            })
            .collect();

        Self {
            account: composition.account().to_owned(),
            region: composition.region().to_owned(),
            units,
            upload: composition.upload().clone(),
        }
    }

    /// Units in materialisation order.
    #[must_use]
    pub fn units(&self) -> &[PlannedUnit] {
        &self.units
    }

    /// Pretty-printed JSON for the plan.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error if the plan cannot be encoded.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
