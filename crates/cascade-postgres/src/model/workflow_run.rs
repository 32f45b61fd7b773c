//! Workflow run model and its owned collections.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::{workflow_pipeline_runs, workflow_run_states, workflow_runs};
use crate::types::RunState;

/// One execution of a workflow.
///
/// Owns one [`WorkflowPipelineRun`] per workflow pipeline (as of run
/// creation) and an append-only state log.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowRun {
    /// Unique run identifier.
    pub id: Uuid,
    /// Workflow this run executes.
    pub workflow_id: Uuid,
    /// Timestamp when the run was created.
    pub created_at: Timestamp,
    /// Timestamp when the run was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new workflow run.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = workflow_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowRun {
    /// Workflow to execute.
    pub workflow_id: Uuid,
}

/// Binds a workflow pipeline to the pipeline run created for it
/// inside a workflow run.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_pipeline_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowPipelineRun {
    /// Unique binding identifier.
    pub id: Uuid,
    /// Owning workflow run.
    pub workflow_run_id: Uuid,
    /// Workflow pipeline node.
    pub workflow_pipeline_id: Uuid,
    /// Pipeline run executing the node.
    pub pipeline_run_id: Uuid,
    /// Timestamp when the binding was created.
    pub created_at: Timestamp,
}

/// Data for binding a node to its pipeline run.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = workflow_pipeline_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowPipelineRun {
    /// Owning workflow run.
    pub workflow_run_id: Uuid,
    /// Workflow pipeline node.
    pub workflow_pipeline_id: Uuid,
    /// Pipeline run executing the node.
    pub pipeline_run_id: Uuid,
}

/// One entry in a workflow run's append-only state log.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_run_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowRunState {
    /// Unique entry identifier (UUIDv7, time-ordered).
    pub id: Uuid,
    /// Run this entry belongs to.
    pub workflow_run_id: Uuid,
    /// Recorded state.
    pub state: RunState,
    /// Timestamp when the state was recorded.
    pub created_at: Timestamp,
}

/// Data for appending a workflow-run state-log entry.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = workflow_run_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowRunState {
    /// Entry identifier; UUIDv7 so `(created_at, id)` totally orders the log.
    pub id: Uuid,
    /// Run to append to.
    pub workflow_run_id: Uuid,
    /// State to record.
    pub state: RunState,
}

impl NewWorkflowRunState {
    /// Creates a state-log entry for the given workflow run.
    pub fn new(workflow_run_id: Uuid, state: RunState) -> Self {
        Self {
            id: Uuid::now_v7(),
            workflow_run_id,
            state,
        }
    }
}
