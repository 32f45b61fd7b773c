//! Pipeline management handlers for CRUD operations.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use cascade_postgres::PgClient;
use cascade_postgres::query::PipelineRepository;
use cascade_postgres::scoped_futures::ScopedFutureExt;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{
    CreatePipeline, PaginationParams, PipelinePathParams, UpdatePipeline,
};
use crate::handler::response::{ErrorResponse, Pipeline};
use crate::handler::{Error, ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for pipeline operations.
const TRACING_TARGET: &str = "cascade_server::handler::pipelines";

/// Creates a new pipeline template.
///
/// The request must name either a Docker image or a repository to build.
#[tracing::instrument(skip_all)]
async fn create_pipeline(
    State(pg_client): State<PgClient>,
    ValidateJson(request): ValidateJson<CreatePipeline>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating pipeline");

    let mut conn = pg_client.get_connection().await?;
    let pipeline = conn.create_pipeline(request.into_model()).await?;

    let response = Pipeline::from_model(pipeline);

    tracing::info!(
        target: TRACING_TARGET,
        pipeline_id = %response.uuid,
        "Pipeline created",
    );

    Ok((StatusCode::OK, Json(response)))
}

fn create_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create pipeline")
        .description("Creates a new pipeline. Either a Docker image URL or a repository SSH URL is required.")
        .response::<200, Json<Pipeline>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Lists pipelines, newest first.
#[tracing::instrument(skip_all)]
async fn list_pipelines(
    State(pg_client): State<PgClient>,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<Pipeline>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing pipelines");

    let mut conn = pg_client.get_connection().await?;
    let pipelines = conn.list_pipelines(pagination.into()).await?;

    let response = pipelines.into_iter().map(Pipeline::from_model).collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_pipelines_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List pipelines")
        .description("Returns all pipelines, newest first.")
        .response::<200, Json<Vec<Pipeline>>>()
}

/// Retrieves a pipeline by ID.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn get_pipeline(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<PipelinePathParams>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Getting pipeline");

    let mut conn = pg_client.get_connection().await?;

    let Some(pipeline) = conn.find_pipeline_by_id(path_params.pipeline_id).await? else {
        return Err(ErrorKind::NotFound
            .with_message("Pipeline not found")
            .with_resource("pipeline"));
    };

    Ok((StatusCode::OK, Json(Pipeline::from_model(pipeline))))
}

fn get_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get pipeline")
        .description("Returns a pipeline by its unique identifier.")
        .response::<200, Json<Pipeline>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Replaces a pipeline's attributes.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn update_pipeline(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<PipelinePathParams>,
    ValidateJson(request): ValidateJson<UpdatePipeline>,
) -> Result<(StatusCode, Json<Pipeline>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating pipeline");

    let mut conn = pg_client.get_connection().await?;

    if conn
        .find_pipeline_by_id(path_params.pipeline_id)
        .await?
        .is_none()
    {
        return Err(ErrorKind::NotFound
            .with_message("Pipeline not found")
            .with_resource("pipeline"));
    }

    let pipeline = conn
        .update_pipeline(path_params.pipeline_id, request.into_model())
        .await?;

    tracing::info!(target: TRACING_TARGET, "Pipeline updated");

    Ok((StatusCode::OK, Json(Pipeline::from_model(pipeline))))
}

fn update_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update pipeline")
        .description("Overwrites a pipeline's attributes.")
        .response::<200, Json<Pipeline>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Soft-deletes a pipeline.
///
/// Deletion is blocked while any live workflow pipeline references the
/// template.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn delete_pipeline(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<PipelinePathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting pipeline");

    let mut conn = pg_client.get_connection().await?;

    // The reference check and the delete must see the same graph: a
    // concurrent workflow-pipeline mutation could otherwise bind the
    // pipeline between the two statements.
    conn.transaction::<_, Error<'static>, _>(|conn| {
        async move {
            let Some(pipeline) = conn.find_pipeline_by_id(path_params.pipeline_id).await? else {
                return Err(ErrorKind::NotFound
                    .with_message("Pipeline not found")
                    .with_resource("pipeline"));
            };

            let references = conn.count_live_pipeline_references(pipeline.id).await?;
            if references > 0 {
                return Err(ErrorKind::Conflict
                    .with_message("Pipeline is referenced by a workflow")
                    .with_resource("pipeline"));
            }

            conn.delete_pipeline(pipeline.id).await?;

            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!(target: TRACING_TARGET, "Pipeline deleted");

    Ok(StatusCode::OK)
}

fn delete_pipeline_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete pipeline")
        .description("Soft-deletes a pipeline. Fails while a live workflow references it.")
        .response::<200, ()>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all pipeline-related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/pipelines",
            post_with(create_pipeline, create_pipeline_docs)
                .get_with(list_pipelines, list_pipelines_docs),
        )
        .api_route(
            "/pipelines/{pipelineId}",
            get_with(get_pipeline, get_pipeline_docs)
                .put_with(update_pipeline, update_pipeline_docs)
                .delete_with(delete_pipeline, delete_pipeline_docs),
        )
        .with_path_items(|item| item.tag("Pipelines"))
}
