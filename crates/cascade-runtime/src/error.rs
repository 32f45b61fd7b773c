//! Workflow runtime error types.

use cascade_postgres::types::RunState;
use thiserror::Error;
use uuid::Uuid;

/// Result type for workflow runtime operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur in the workflow runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Adding the edge (or validating the graph) would introduce a cycle.
    #[error("cycle detected in workflow graph")]
    CycleDetected,

    /// The requested state change is not in the transition table.
    #[error("invalid state transition: {from}->{to}")]
    InvalidTransition {
        /// Current state.
        from: RunState,
        /// Requested state.
        to: RunState,
    },

    /// The workflow has no nodes without predecessors to start from.
    #[error("workflow has no runnable roots")]
    NoRunnableRoots,

    /// An edge references a node that is not part of the graph.
    #[error("unknown workflow pipeline {0} referenced by an edge")]
    UnknownNode(Uuid),

    /// The pipeline run does not belong to the workflow run being scheduled.
    #[error("pipeline run {0} does not belong to this workflow run")]
    UnknownPipelineRun(Uuid),

    /// A pipeline run reported a state the scheduler can never react to.
    #[error("unexpected state {state} reported for pipeline run {pipeline_run_id}")]
    UnexpectedState {
        /// Run that reported the state.
        pipeline_run_id: Uuid,
        /// The offending state.
        state: RunState,
    },
}
