//! Pipeline run response types.

use cascade_postgres::model;
use cascade_postgres::types::RunState;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of a run's state log.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunStateEntry {
    /// Recorded state name.
    pub state: RunState,
    /// Stable numeric code of the state.
    pub code: i32,
    /// When the state was recorded.
    pub created_at: Timestamp,
}

impl RunStateEntry {
    /// Builds the entry from a pipeline-run state row.
    pub fn from_model(state: model::PipelineRunState) -> Self {
        Self {
            state: state.state,
            code: state.state.code(),
            created_at: state.created_at.into(),
        }
    }

    /// Builds the entry from a workflow-run state row.
    pub fn from_workflow_model(state: model::WorkflowRunState) -> Self {
        Self {
            state: state.state,
            code: state.state.code(),
            created_at: state.created_at.into(),
        }
    }
}

/// An input attached to a run.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    /// Input filename.
    pub name: String,
    /// URL the worker fetches the input from.
    pub url: String,
}

impl RunInput {
    /// Builds the response from the database model.
    pub fn from_model(input: model::PipelineRunInput) -> Self {
        Self {
            name: input.filename,
            url: input.url,
        }
    }
}

/// An artifact with a freshly minted presigned download URL.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Artifact identifier.
    pub uuid: Uuid,
    /// Artifact filename.
    pub name: String,
    /// Presigned GET URL for the artifact bytes.
    pub url: String,
}

impl Artifact {
    /// Builds the response from the model and its presigned URL.
    pub fn from_model(artifact: model::PipelineRunArtifact, url: String) -> Self {
        Self {
            uuid: artifact.id,
            name: artifact.name,
            url,
        }
    }
}

/// Full view of a pipeline run with its owned collections.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    /// Run identifier.
    pub uuid: Uuid,
    /// Per-pipeline sequence number.
    pub sequence: i32,
    /// Worker address, once a worker picked the run up.
    pub worker_ip: Option<String>,
    /// Callback URL notified on state changes.
    pub callback_url: Option<String>,
    /// Execution start timestamp.
    pub started_at: Option<Timestamp>,
    /// Execution completion timestamp.
    pub completed_at: Option<Timestamp>,
    /// Captured standard output.
    pub stdout: Option<String>,
    /// Captured standard error.
    pub stderr: Option<String>,
    /// Inputs in attachment order.
    pub inputs: Vec<RunInput>,
    /// State log in recording order.
    pub states: Vec<RunStateEntry>,
    /// Artifacts with presigned URLs.
    pub artifacts: Vec<Artifact>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl PipelineRun {
    /// Assembles the response from the run and its owned collections.
    pub fn from_parts(
        run: model::PipelineRun,
        inputs: Vec<model::PipelineRunInput>,
        states: Vec<model::PipelineRunState>,
        artifacts: Vec<(model::PipelineRunArtifact, String)>,
    ) -> Self {
        Self {
            uuid: run.id,
            sequence: run.sequence,
            worker_ip: run.worker_ip.map(|ip| ip.addr().to_string()),
            callback_url: run.callback_url,
            started_at: run.started_at.map(Into::into),
            completed_at: run.completed_at.map(Into::into),
            stdout: run.stdout,
            stderr: run.stderr,
            inputs: inputs.into_iter().map(RunInput::from_model).collect(),
            states: states.into_iter().map(RunStateEntry::from_model).collect(),
            artifacts: artifacts
                .into_iter()
                .map(|(artifact, url)| Artifact::from_model(artifact, url))
                .collect(),
            created_at: run.created_at.into(),
            updated_at: run.updated_at.into(),
        }
    }
}

/// Compact view of a pipeline run for listings.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSummary {
    /// Run identifier.
    pub uuid: Uuid,
    /// Per-pipeline sequence number.
    pub sequence: i32,
    /// Execution start timestamp.
    pub started_at: Option<Timestamp>,
    /// Execution completion timestamp.
    pub completed_at: Option<Timestamp>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl PipelineRunSummary {
    /// Builds the summary from the run head row.
    pub fn from_model(run: model::PipelineRun) -> Self {
        Self {
            uuid: run.id,
            sequence: run.sequence,
            started_at: run.started_at.map(Into::into),
            completed_at: run.completed_at.map(Into::into),
            created_at: run.created_at.into(),
        }
    }
}
