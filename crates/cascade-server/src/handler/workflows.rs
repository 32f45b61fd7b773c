//! Workflow management handlers for CRUD operations.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use cascade_postgres::PgClient;
use cascade_postgres::query::WorkflowRepository;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{
    CreateWorkflow, PaginationParams, UpdateWorkflow, WorkflowPathParams,
};
use crate::handler::response::{ErrorResponse, Workflow};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for workflow operations.
const TRACING_TARGET: &str = "cascade_server::handler::workflows";

/// Creates a new workflow.
#[tracing::instrument(skip_all)]
async fn create_workflow(
    State(pg_client): State<PgClient>,
    ValidateJson(request): ValidateJson<CreateWorkflow>,
) -> Result<(StatusCode, Json<Workflow>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating workflow");

    let mut conn = pg_client.get_connection().await?;
    let workflow = conn.create_workflow(request.into_model()).await?;

    let response = Workflow::from_model(workflow);

    tracing::info!(
        target: TRACING_TARGET,
        workflow_id = %response.uuid,
        "Workflow created",
    );

    Ok((StatusCode::OK, Json(response)))
}

fn create_workflow_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create workflow")
        .description("Creates a new, empty workflow.")
        .response::<200, Json<Workflow>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Lists workflows, newest first.
#[tracing::instrument(skip_all)]
async fn list_workflows(
    State(pg_client): State<PgClient>,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<Workflow>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing workflows");

    let mut conn = pg_client.get_connection().await?;
    let workflows = conn.list_workflows(pagination.into()).await?;

    let response = workflows.into_iter().map(Workflow::from_model).collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_workflows_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List workflows")
        .description("Returns all workflows, newest first.")
        .response::<200, Json<Vec<Workflow>>>()
}

/// Retrieves a workflow by ID.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn get_workflow(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<WorkflowPathParams>,
) -> Result<(StatusCode, Json<Workflow>)> {
    tracing::debug!(target: TRACING_TARGET, "Getting workflow");

    let mut conn = pg_client.get_connection().await?;

    let Some(workflow) = conn.find_workflow_by_id(path_params.workflow_id).await? else {
        return Err(ErrorKind::NotFound
            .with_message("Workflow not found")
            .with_resource("workflow"));
    };

    Ok((StatusCode::OK, Json(Workflow::from_model(workflow))))
}

fn get_workflow_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get workflow")
        .description("Returns a workflow by its unique identifier.")
        .response::<200, Json<Workflow>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Replaces a workflow's attributes.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn update_workflow(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<WorkflowPathParams>,
    ValidateJson(request): ValidateJson<UpdateWorkflow>,
) -> Result<(StatusCode, Json<Workflow>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating workflow");

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

    let workflow = conn
        .update_workflow(path_params.workflow_id, request.into_model())
        .await?;

    tracing::info!(target: TRACING_TARGET, "Workflow updated");

    Ok((StatusCode::OK, Json(Workflow::from_model(workflow))))
}

fn update_workflow_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update workflow")
        .description("Overwrites a workflow's name and description.")
        .response::<200, Json<Workflow>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Soft-deletes a workflow and all of its workflow pipelines.
#[tracing::instrument(skip_all, fields(workflow_id = %path_params.workflow_id))]
async fn delete_workflow(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<WorkflowPathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting workflow");

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

    conn.delete_workflow(path_params.workflow_id).await?;

    tracing::info!(target: TRACING_TARGET, "Workflow deleted");

    Ok(StatusCode::OK)
}

fn delete_workflow_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete workflow")
        .description("Soft-deletes a workflow; its nodes cascade and their edges go dead.")
        .response::<200, ()>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all workflow-related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/workflows",
            post_with(create_workflow, create_workflow_docs)
                .get_with(list_workflows, list_workflows_docs),
        )
        .api_route(
            "/workflows/{workflowId}",
            get_with(get_workflow, get_workflow_docs)
                .put_with(update_workflow, update_workflow_docs)
                .delete_with(delete_workflow, delete_workflow_docs),
        )
        .with_path_items(|item| item.tag("Workflows"))
}
