//! Workflow run request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::RunInput;

/// Request payload for starting a workflow run.
///
/// The inputs are attached to every root node that has no inputs of its own;
/// downstream nodes receive their inputs from upstream artifacts instead.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRun {
    /// Inputs handed to the workflow's root runs.
    #[validate(nested)]
    #[serde(default)]
    pub inputs: Vec<RunInput>,
}
