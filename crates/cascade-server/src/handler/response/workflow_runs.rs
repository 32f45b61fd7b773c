//! Workflow run response types.

use cascade_postgres::model;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pipeline_runs::{PipelineRun, RunStateEntry};

/// A workflow graph node paired with the pipeline run executing it.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPipelineRun {
    /// Binding identifier.
    pub uuid: Uuid,
    /// Workflow pipeline (graph node) identifier.
    pub workflow_pipeline_uuid: Uuid,
    /// The pipeline run executing the node.
    pub pipeline_run: PipelineRun,
}

/// Full view of a workflow run.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    /// Workflow run identifier.
    pub uuid: Uuid,
    /// State log in recording order.
    pub states: Vec<RunStateEntry>,
    /// One entry per workflow pipeline of the workflow.
    pub workflow_pipeline_runs: Vec<WorkflowPipelineRun>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl WorkflowRun {
    /// Assembles the response from the run, its state log and node views.
    pub fn from_parts(
        run: model::WorkflowRun,
        states: Vec<model::WorkflowRunState>,
        workflow_pipeline_runs: Vec<WorkflowPipelineRun>,
    ) -> Self {
        Self {
            uuid: run.id,
            states: states
                .into_iter()
                .map(RunStateEntry::from_workflow_model)
                .collect(),
            workflow_pipeline_runs,
            created_at: run.created_at.into(),
            updated_at: run.updated_at.into(),
        }
    }
}

/// Compact view of a workflow run for listings.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRunSummary {
    /// Workflow run identifier.
    pub uuid: Uuid,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl WorkflowRunSummary {
    /// Builds the summary from the run head row.
    pub fn from_model(run: model::WorkflowRun) -> Self {
        Self {
            uuid: run.id,
            created_at: run.created_at.into(),
        }
    }
}
