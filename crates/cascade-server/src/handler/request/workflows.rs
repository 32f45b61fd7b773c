//! Workflow request types.

use cascade_postgres::model::{NewWorkflow, UpdateWorkflow as UpdateWorkflowModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for creating a new workflow.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflow {
    /// Workflow name (1-120 characters).
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Description of the workflow (max 500 characters).
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
}

impl CreateWorkflow {
    /// Converts this request into a [`NewWorkflow`] model for insertion.
    #[inline]
    pub fn into_model(self) -> NewWorkflow {
        NewWorkflow {
            name: self.name,
            description: self.description,
        }
    }
}

/// Request payload to update an existing workflow.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflow {
    /// New workflow name (1-120 characters).
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// New description (max 500 characters).
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
}

impl UpdateWorkflow {
    /// Converts this request into an [`UpdateWorkflowModel`].
    pub fn into_model(self) -> UpdateWorkflowModel {
        UpdateWorkflowModel {
            name: Some(self.name),
            description: Some(self.description),
        }
    }
}
