//! Workflow runtime error mapping into HTTP errors.

use cascade_runtime::WorkflowError;

use super::{Error, ErrorKind};

impl From<WorkflowError> for Error<'static> {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::CycleDetected => ErrorKind::BadRequest
                .with_message("Adding this dependency would create a cycle")
                .with_resource("workflow_pipeline_dependency"),
            WorkflowError::InvalidTransition { from, to } => ErrorKind::BadRequest
                .with_message(format!("Invalid state transition: {from}->{to}")),
            WorkflowError::NoRunnableRoots => ErrorKind::BadRequest
                .with_message("Workflow has no runnable roots")
                .with_resource("workflow"),
            WorkflowError::UnknownNode(id) => ErrorKind::BadRequest
                .with_message("Unknown workflow pipeline referenced")
                .with_context(id.to_string()),
            WorkflowError::UnknownPipelineRun(id) => ErrorKind::BadRequest
                .with_message("Pipeline run does not belong to this workflow run")
                .with_context(id.to_string()),
            WorkflowError::UnexpectedState {
                pipeline_run_id,
                state,
            } => ErrorKind::BadRequest
                .with_message(format!("Unexpected state {state} reported"))
                .with_context(pipeline_run_id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use cascade_postgres::types::RunState;

    use super::*;

    #[test]
    fn cycle_detection_maps_to_bad_request() {
        let error = Error::from(WorkflowError::CycleDetected);
        assert_eq!(error.kind().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let error = Error::from(WorkflowError::InvalidTransition {
            from: RunState::Completed,
            to: RunState::Running,
        });
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        let message = error.message().unwrap().to_owned();
        assert!(message.contains("COMPLETED"));
        assert!(message.contains("RUNNING"));
    }
}
