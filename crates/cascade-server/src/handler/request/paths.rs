//! Path parameter types shared by the handlers.

use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

/// Path parameters for pipeline-scoped routes.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePathParams {
    /// Pipeline identifier.
    pub pipeline_id: Uuid,
}

/// Path parameters for pipeline-run-scoped routes.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunPathParams {
    /// Pipeline identifier.
    pub pipeline_id: Uuid,
    /// Pipeline run identifier.
    pub run_id: Uuid,
}

/// Path parameters for workflow-scoped routes.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPathParams {
    /// Workflow identifier.
    pub workflow_id: Uuid,
}

/// Path parameters for workflow-pipeline-scoped routes.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPipelinePathParams {
    /// Workflow identifier.
    pub workflow_id: Uuid,
    /// Workflow pipeline (graph node) identifier.
    pub workflow_pipeline_id: Uuid,
}

/// Path parameters for workflow-run-scoped routes.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRunPathParams {
    /// Workflow identifier.
    pub workflow_id: Uuid,
    /// Workflow run identifier.
    pub workflow_run_id: Uuid,
}
