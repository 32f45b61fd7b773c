//! Pipeline run model and its owned collections.

use diesel::prelude::*;
use ipnet::IpNet;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::{
    pipeline_run_artifacts, pipeline_run_inputs, pipeline_run_states, pipeline_runs,
};
use crate::types::RunState;

/// A single execution of a pipeline.
///
/// The run's state lives in an append-only log ([`PipelineRunState`]); the
/// head row only carries scalar execution metadata.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = pipeline_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PipelineRun {
    /// Unique run identifier.
    pub id: Uuid,
    /// Pipeline this run executes.
    pub pipeline_id: Uuid,
    /// Monotonic per-pipeline sequence number, starting at 1.
    pub sequence: i32,
    /// Address of the worker that picked up the run.
    pub worker_ip: Option<IpNet>,
    /// URL notified on state changes, when the creator asked for one.
    pub callback_url: Option<String>,
    /// Timestamp when execution started.
    pub started_at: Option<Timestamp>,
    /// Timestamp when execution reached a terminal state.
    pub completed_at: Option<Timestamp>,
    /// Captured standard output.
    pub stdout: Option<String>,
    /// Captured standard error.
    pub stderr: Option<String>,
    /// Timestamp when the run was created.
    pub created_at: Timestamp,
    /// Timestamp when the run was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new pipeline run.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pipeline_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPipelineRun {
    /// Pipeline to execute.
    pub pipeline_id: Uuid,
    /// Per-pipeline sequence number.
    pub sequence: i32,
    /// Optional callback URL.
    pub callback_url: Option<String>,
}

/// Scalar updates to a pipeline run's head row.
#[derive(Debug, Default, Clone, AsChangeset)]
#[diesel(table_name = pipeline_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdatePipelineRun {
    /// Worker address.
    pub worker_ip: Option<IpNet>,
    /// Execution start timestamp.
    pub started_at: Option<Timestamp>,
    /// Execution completion timestamp.
    pub completed_at: Option<Timestamp>,
    /// Captured standard output.
    pub stdout: Option<String>,
    /// Captured standard error.
    pub stderr: Option<String>,
}

/// An input handed to a pipeline run: a named, fetchable URL.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = pipeline_run_inputs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PipelineRunInput {
    /// Unique input identifier.
    pub id: Uuid,
    /// Run this input belongs to.
    pub pipeline_run_id: Uuid,
    /// Filename the worker stores the download under.
    pub filename: String,
    /// URL the worker fetches the input from.
    pub url: String,
    /// Artifact this input was copied from, when it crossed a workflow edge.
    pub source_artifact_id: Option<Uuid>,
    /// Timestamp when the input was attached.
    pub created_at: Timestamp,
}

/// Data for attaching an input to a run.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = pipeline_run_inputs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPipelineRunInput {
    /// Run to attach to.
    pub pipeline_run_id: Uuid,
    /// Input filename.
    pub filename: String,
    /// Input URL.
    pub url: String,
    /// Source artifact for copies across workflow edges.
    pub source_artifact_id: Option<Uuid>,
}

/// A file produced by a pipeline run.
///
/// The object-store key is derived, never stored:
/// `{pipeline_id}/{pipeline_run_id}/{id}-{name}`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = pipeline_run_artifacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PipelineRunArtifact {
    /// Unique artifact identifier.
    pub id: Uuid,
    /// Run that produced the artifact.
    pub pipeline_run_id: Uuid,
    /// Sanitised artifact filename.
    pub name: String,
    /// Timestamp when the artifact was recorded.
    pub created_at: Timestamp,
}

/// Data for recording a new artifact.
///
/// The id is minted by the caller before the object-store upload so the
/// stored bytes and the metadata row share the same identifier.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pipeline_run_artifacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPipelineRunArtifact {
    /// Pre-minted artifact identifier.
    pub id: Uuid,
    /// Run that produced the artifact.
    pub pipeline_run_id: Uuid,
    /// Sanitised artifact filename.
    pub name: String,
}

/// One entry in a pipeline run's append-only state log.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = pipeline_run_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PipelineRunState {
    /// Unique entry identifier (UUIDv7, time-ordered).
    pub id: Uuid,
    /// Run this entry belongs to.
    pub pipeline_run_id: Uuid,
    /// Recorded state.
    pub state: RunState,
    /// Timestamp when the state was recorded.
    pub created_at: Timestamp,
}

/// Data for appending a state-log entry.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pipeline_run_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPipelineRunState {
    /// Entry identifier; UUIDv7 so `(created_at, id)` totally orders the log.
    pub id: Uuid,
    /// Run to append to.
    pub pipeline_run_id: Uuid,
    /// State to record.
    pub state: RunState,
}

impl NewPipelineRunState {
    /// Creates a state-log entry for the given run.
    pub fn new(pipeline_run_id: Uuid, state: RunState) -> Self {
        Self {
            id: Uuid::now_v7(),
            pipeline_run_id,
            state,
        }
    }
}

impl PipelineRun {
    /// Returns whether the run has captured any console output.
    pub fn has_output(&self) -> bool {
        self.stdout.is_some() || self.stderr.is_some()
    }
}
