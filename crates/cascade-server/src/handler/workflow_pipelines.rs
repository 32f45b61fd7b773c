//! Workflow pipeline handlers: graph nodes and their dependency edges.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use cascade_postgres::PgClient;
use cascade_postgres::query::{WorkflowPipelineRepository, WorkflowRepository};

use crate::extract::{Json, Path, ValidateJson};
use crate::handler::request::{
    WorkflowPathParams, WorkflowPipelinePathParams, WorkflowPipelineSpec,
};
use crate::handler::response::{ErrorResponse, WorkflowPipeline};
use crate::handler::{ErrorKind, Result};
use crate::service::{ServiceState, WorkflowCompositionService};

/// Tracing target for workflow pipeline operations.
const TRACING_TARGET: &str = "cascade_server::handler::workflow_pipelines";

/// Adds a node to a workflow's graph.
///
/// The whole operation is atomic: when the new edges would close a cycle,
/// neither the node nor any edge is created.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn create_workflow_pipeline(
    State(state): State<ServiceState>,
    Path(path_params): Path<WorkflowPathParams>,
    ValidateJson(request): ValidateJson<WorkflowPipelineSpec>,
) -> Result<(StatusCode, Json<WorkflowPipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating workflow pipeline");

    let service = WorkflowCompositionService::new(&state);
    let (node, edges) = service
        .create_workflow_pipeline(path_params.workflow_id, request)
        .await?;

    let response = WorkflowPipeline::from_parts(node, &edges);

    tracing::info!(
        target: TRACING_TARGET,
        workflow_pipeline_id = %response.uuid,
        "Workflow pipeline created",
    );

    Ok((StatusCode::OK, Json(response)))
}

fn create_workflow_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create workflow pipeline")
        .description("Adds a node bound to a pipeline, plus edges from the listed sources and to the listed destinations. Rejected atomically when a cycle would form.")
        .response::<200, Json<WorkflowPipeline>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists the nodes of a workflow with their incident edges.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn list_workflow_pipelines(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<WorkflowPathParams>,
) -> Result<(StatusCode, Json<Vec<WorkflowPipeline>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing workflow pipelines");

    let mut conn = pg_client.get_connection().await?;

    if conn
        .find_workflow_by_id(path_params.workflow_id)
        .await?
        .is_none()
    {
        return Err(ErrorKind::NotFound
            .with_message("Workflow not found")
            .with_resource("workflow"));
    }

    let nodes = conn.list_workflow_pipelines(path_params.workflow_id).await?;
    let edges = conn
        .list_workflow_dependencies(path_params.workflow_id)
        .await?;

    let response = nodes
        .into_iter()
        .map(|node| WorkflowPipeline::from_parts(node, &edges))
        .collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_workflow_pipelines_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List workflow pipelines")
        .description("Returns the live nodes of the workflow with their incident edges.")
        .response::<200, Json<Vec<WorkflowPipeline>>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Retrieves one node with its incident edges.
#[tracing::instrument(
    skip_all,
    fields(
        workflow_id = %path_params.workflow_id,
        workflow_pipeline_id = %path_params.workflow_pipeline_id,
    )
)]
async fn get_workflow_pipeline(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<WorkflowPipelinePathParams>,
) -> Result<(StatusCode, Json<WorkflowPipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Getting workflow pipeline");

    let mut conn = pg_client.get_connection().await?;

    let Some(node) = conn
        .find_workflow_pipeline(path_params.workflow_id, path_params.workflow_pipeline_id)
        .await?
    else {
        return Err(ErrorKind::NotFound
            .with_message("Workflow pipeline not found")
            .with_resource("workflow_pipeline"));
    };

    let edges = conn.list_incident_dependencies(node.id).await?;

    Ok((
        StatusCode::OK,
        Json(WorkflowPipeline::from_parts(node, &edges)),
    ))
}

fn get_workflow_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get workflow pipeline")
        .description("Returns a node with its upstream and downstream edges.")
        .response::<200, Json<WorkflowPipeline>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Reconciles a node to the requested pipeline binding and edge sets.
#[tracing::instrument(
    skip_all,
    fields(
        workflow_id = %path_params.workflow_id,
        workflow_pipeline_id = %path_params.workflow_pipeline_id,
    )
)]
async fn update_workflow_pipeline(
    State(state): State<ServiceState>,
    Path(path_params): Path<WorkflowPipelinePathParams>,
    ValidateJson(request): ValidateJson<WorkflowPipelineSpec>,
) -> Result<(StatusCode, Json<WorkflowPipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating workflow pipeline");

    let service = WorkflowCompositionService::new(&state);
    let (node, edges) = service
        .update_workflow_pipeline(
            path_params.workflow_id,
            path_params.workflow_pipeline_id,
            request,
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(WorkflowPipeline::from_parts(node, &edges)),
    ))
}

fn update_workflow_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update workflow pipeline")
        .description("Reconciles the node's incident edges to match the request and swaps the bound pipeline if changed. Re-posting the current sets is a no-op.")
        .response::<200, Json<WorkflowPipeline>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Soft-deletes a node and its incident edges.
#[tracing::instrument(
    skip_all,
    fields(
        workflow_id = %path_params.workflow_id,
        workflow_pipeline_id = %path_params.workflow_pipeline_id,
    )
)]
async fn delete_workflow_pipeline(
    State(state): State<ServiceState>,
    Path(path_params): Path<WorkflowPipelinePathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting workflow pipeline");

    let service = WorkflowCompositionService::new(&state);
    service
        .delete_workflow_pipeline(path_params.workflow_id, path_params.workflow_pipeline_id)
        .await?;

    Ok(StatusCode::OK)
}

fn delete_workflow_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete workflow pipeline")
        .description("Soft-deletes a node; its incident edges are removed.")
        .response::<200, ()>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all workflow-pipeline-related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/workflows/{workflowId}/pipelines",
            post_with(create_workflow_pipeline, create_workflow_pipeline_docs)
                .get_with(list_workflow_pipelines, list_workflow_pipelines_docs),
        )
        .api_route(
            "/workflows/{workflowId}/pipelines/{workflowPipelineId}",
            get_with(get_workflow_pipeline, get_workflow_pipeline_docs)
                .put_with(update_workflow_pipeline, update_workflow_pipeline_docs)
                .delete_with(delete_workflow_pipeline, delete_workflow_pipeline_docs),
        )
        .with_path_items(|item| item.tag("Workflow Pipelines"))
}
