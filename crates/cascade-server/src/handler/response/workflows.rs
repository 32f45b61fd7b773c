//! Workflow response types.

use cascade_postgres::model;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a workflow.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Workflow identifier.
    pub uuid: Uuid,
    /// Workflow name.
    pub name: String,
    /// Workflow description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl Workflow {
    /// Builds the response from the database model.
    pub fn from_model(workflow: model::Workflow) -> Self {
        Self {
            uuid: workflow.id,
            name: workflow.name,
            description: workflow.description,
            created_at: workflow.created_at.into(),
            updated_at: workflow.updated_at.into(),
        }
    }
}
