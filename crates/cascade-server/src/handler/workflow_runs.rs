//! Workflow run handlers: run creation and aggregate views.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{
    CreateWorkflowRun, PaginationParams, WorkflowPathParams, WorkflowRunPathParams,
};
use crate::handler::response::{
    ErrorResponse, PipelineRun, WorkflowPipelineRun, WorkflowRun, WorkflowRunSummary,
};
use crate::handler::Result;
use crate::service::{ServiceState, WorkflowRunDetail, WorkflowRunService};

/// Tracing target for workflow run operations.
const TRACING_TARGET: &str = "cascade_server::handler::workflow_runs";

fn run_response(detail: WorkflowRunDetail) -> WorkflowRun {
    let nodes = detail
        .nodes
        .into_iter()
        .map(|(binding, pipeline_run)| WorkflowPipelineRun {
            uuid: binding.id,
            workflow_pipeline_uuid: binding.workflow_pipeline_id,
            pipeline_run: PipelineRun::from_parts(
                pipeline_run.run,
                pipeline_run.inputs,
                pipeline_run.states,
                pipeline_run.artifacts,
            ),
        })
        .collect();

    WorkflowRun::from_parts(detail.run, detail.states, nodes)
}

/// Starts a workflow run.
///
/// Creates one queued pipeline run per node, attaches the request inputs to
/// the roots and dispatches the roots once the transaction commits.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn create_workflow_run(
    State(state): State<ServiceState>,
    Path(path_params): Path<WorkflowPathParams>,
    ValidateJson(request): ValidateJson<CreateWorkflowRun>,
) -> Result<(StatusCode, Json<WorkflowRun>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating workflow run");

    let service = WorkflowRunService::new(&state);
    let detail = service.create_run(path_params.workflow_id, request).await?;

    let response = run_response(detail);

    tracing::info!(
        target: TRACING_TARGET,
        workflow_run_id = %response.uuid,
        "Workflow run created",
    );

    Ok((StatusCode::OK, Json(response)))
}

fn create_workflow_run_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create workflow run")
        .description("Creates a run of the workflow: every node queued, roots started. Fails when the workflow has no runnable roots.")
        .response::<200, Json<WorkflowRun>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists a workflow's runs, newest first.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn list_workflow_runs(
    State(state): State<ServiceState>,
    Path(path_params): Path<WorkflowPathParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<WorkflowRunSummary>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing workflow runs");

    let service = WorkflowRunService::new(&state);
    let runs = service
        .list_runs(path_params.workflow_id, pagination.into())
        .await?;

    let response = runs
        .into_iter()
        .map(WorkflowRunSummary::from_model)
        .collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_workflow_runs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List workflow runs")
        .description("Returns the runs of a workflow, newest first.")
        .response::<200, Json<Vec<WorkflowRunSummary>>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Retrieves one workflow run with every pipeline run's detail.
#[tracing::instrument(
    skip_all,
    fields(
        workflow_id = %path_params.workflow_id,
        workflow_run_id = %path_params.workflow_run_id,
    )
)]
async fn get_workflow_run(
    State(state): State<ServiceState>,
    Path(path_params): Path<WorkflowRunPathParams>,
) -> Result<(StatusCode, Json<WorkflowRun>)> {
    tracing::debug!(target: TRACING_TARGET, "Getting workflow run");

    let service = WorkflowRunService::new(&state);
    let detail = service
        .get_run(path_params.workflow_id, path_params.workflow_run_id)
        .await?;

    Ok((StatusCode::OK, Json(run_response(detail))))
}

fn get_workflow_run_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get workflow run")
        .description("Returns the full aggregate: state log plus every node's pipeline run.")
        .response::<200, Json<WorkflowRun>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all workflow-run-related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/workflows/{workflowId}/runs",
            post_with(create_workflow_run, create_workflow_run_docs)
                .get_with(list_workflow_runs, list_workflow_runs_docs),
        )
        .api_route(
            "/workflows/{workflowId}/runs/{workflowRunId}",
            get_with(get_workflow_run, get_workflow_run_docs),
        )
        .with_path_items(|item| item.tag("Workflow Runs"))
}
