//! Pipeline run handlers: creation, listing, executor callbacks and
//! artifact ingest.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use cascade_postgres::PgClient;
use cascade_postgres::query::{PipelineRepository, PipelineRunRepository};
use ipnet::IpNet;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{
    CreatePipelineRun, PaginationParams, PipelinePathParams, PipelineRunPathParams,
    UpdateRunConsole, UpdateRunState,
};
use crate::handler::response::{
    Artifact, ErrorResponse, PipelineRun, PipelineRunSummary,
};
use crate::handler::{ErrorKind, Result};
use crate::service::{PipelineRunDetail, PipelineRunService, ServiceState};

/// Tracing target for pipeline run operations.
const TRACING_TARGET: &str = "cascade_server::handler::pipeline_runs";

fn run_response(detail: PipelineRunDetail) -> PipelineRun {
    PipelineRun::from_parts(detail.run, detail.inputs, detail.states, detail.artifacts)
}

/// Creates a run for a pipeline.
///
/// Unless `queued` is set, the run is dispatched to the executor
/// immediately after the transaction commits.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn create_pipeline_run(
    State(state): State<ServiceState>,
    Path(path_params): Path<PipelinePathParams>,
    ValidateJson(request): ValidateJson<CreatePipelineRun>,
) -> Result<(StatusCode, Json<PipelineRun>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating pipeline run");

    let service = PipelineRunService::new(&state);
    let detail = service.create_run(path_params.pipeline_id, request).await?;

    Ok((StatusCode::OK, Json(run_response(detail))))
}

fn create_pipeline_run_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create pipeline run")
        .description("Creates a run with the given inputs and, unless queued, starts it immediately.")
        .response::<200, Json<PipelineRun>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists a pipeline's runs in sequence order.
#[tracing::instrument(skip_all, fields(pipeline_id = %path_params.pipeline_id))]
async fn list_pipeline_runs(
    State(pg_client): State<PgClient>,
    Path(path_params): Path<PipelinePathParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<PipelineRunSummary>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing pipeline runs");

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

    let runs = conn
        .list_pipeline_runs(path_params.pipeline_id, pagination.into())
        .await?;

    let response = runs
        .into_iter()
        .map(PipelineRunSummary::from_model)
        .collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_pipeline_runs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List pipeline runs")
        .description("Returns the runs of a pipeline in sequence order.")
        .response::<200, Json<Vec<PipelineRunSummary>>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Retrieves one run with inputs, state log and presigned artifacts.
#[tracing::instrument(
    skip_all,
    fields(
        pipeline_id = %path_params.pipeline_id,
        run_id = %path_params.run_id,
    )
)]
async fn get_pipeline_run(
    State(state): State<ServiceState>,
    Path(path_params): Path<PipelineRunPathParams>,
) -> Result<(StatusCode, Json<PipelineRun>)> {
    tracing::debug!(target: TRACING_TARGET, "Getting pipeline run");

    let service = PipelineRunService::new(&state);
    let detail = service
        .get_run_detail(path_params.pipeline_id, path_params.run_id)
        .await?;

    Ok((StatusCode::OK, Json(run_response(detail))))
}

fn get_pipeline_run_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get pipeline run")
        .description("Returns a run with its inputs, state log and artifact download URLs.")
        .response::<200, Json<PipelineRun>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Executor callback: the run moved to a new state.
///
/// Illegal transitions (including any transition out of a terminal state)
/// are rejected; re-sending the current state is a no-op.
#[tracing::instrument(
    skip_all,
    fields(
        pipeline_id = %path_params.pipeline_id,
        run_id = %path_params.run_id,
        state = %request.state,
    )
)]
async fn update_pipeline_run_state(
    State(state): State<ServiceState>,
    Path(path_params): Path<PipelineRunPathParams>,
    ValidateJson(request): ValidateJson<UpdateRunState>,
) -> Result<(StatusCode, Json<PipelineRunSummary>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating pipeline run state");

    let worker_ip = request.worker_ip.map(IpNet::from);

    let service = PipelineRunService::new(&state);
    let run = service
        .update_state(
            path_params.pipeline_id,
            path_params.run_id,
            request.state,
            worker_ip,
        )
        .await?;

    Ok((StatusCode::OK, Json(PipelineRunSummary::from_model(run))))
}

fn update_pipeline_run_state_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update run state")
        .description("Appends a state to the run's log after checking the transition table. Drives workflow scheduling when the run belongs to a workflow.")
        .response::<200, Json<PipelineRunSummary>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Executor callback: captured console output.
#[tracing::instrument(
    skip_all,
    fields(
        pipeline_id = %path_params.pipeline_id,
        run_id = %path_params.run_id,
    )
)]
async fn update_pipeline_run_console(
    State(state): State<ServiceState>,
    Path(path_params): Path<PipelineRunPathParams>,
    ValidateJson(request): ValidateJson<UpdateRunConsole>,
) -> Result<(StatusCode, Json<PipelineRunSummary>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating pipeline run console output");

    let service = PipelineRunService::new(&state);
    let run = service
        .update_console(path_params.pipeline_id, path_params.run_id, request)
        .await?;

    Ok((StatusCode::OK, Json(PipelineRunSummary::from_model(run))))
}

fn update_pipeline_run_console_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update run console output")
        .description("Stores captured stdout and stderr; last writer wins.")
        .response::<200, Json<PipelineRunSummary>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Executor callback: multipart artifact upload.
///
/// Each file field becomes one artifact; filenames are sanitised before
/// they enter the object-store key.
#[tracing::instrument(
    skip_all,
    fields(
        pipeline_id = %path_params.pipeline_id,
        run_id = %path_params.run_id,
    )
)]
async fn create_pipeline_run_artifacts(
    State(state): State<ServiceState>,
    Path(path_params): Path<PipelineRunPathParams>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Artifact>>)> {
    tracing::debug!(target: TRACING_TARGET, "Uploading pipeline run artifacts");

    let service = PipelineRunService::new(&state);
    let mut artifacts = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        ErrorKind::BadRequest
            .with_message("Malformed multipart body")
            .with_context(error.body_text())
    })? {
        let Some(filename) = field.file_name().map(ToOwned::to_owned) else {
            continue;
        };

        let data = field.bytes().await.map_err(|error| {
            ErrorKind::BadRequest
                .with_message("Failed to read uploaded file")
                .with_context(error.body_text())
        })?;

        let (artifact, url) = service
            .create_artifact(path_params.pipeline_id, path_params.run_id, &filename, data)
            .await?;
        artifacts.push(Artifact::from_model(artifact, url));
    }

    if artifacts.is_empty() {
        return Err(ErrorKind::BadRequest
            .with_message("Multipart body contains no file fields")
            .with_resource("pipeline_run_artifact"));
    }

    Ok((StatusCode::OK, Json(artifacts)))
}

fn create_pipeline_run_artifacts_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Upload run artifacts")
        .description("Multipart upload; every file field becomes one artifact of the run.")
        .response::<200, Json<Vec<Artifact>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all pipeline-run-related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/pipelines/{pipelineId}/runs",
            post_with(create_pipeline_run, create_pipeline_run_docs)
                .get_with(list_pipeline_runs, list_pipeline_runs_docs),
        )
        .api_route(
            "/pipelines/{pipelineId}/runs/{runId}",
            get_with(get_pipeline_run, get_pipeline_run_docs),
        )
        .api_route(
            "/pipelines/{pipelineId}/runs/{runId}/state",
            post_with(update_pipeline_run_state, update_pipeline_run_state_docs),
        )
        .api_route(
            "/pipelines/{pipelineId}/runs/{runId}/console",
            post_with(
                update_pipeline_run_console,
                update_pipeline_run_console_docs,
            ),
        )
        .api_route(
            "/pipelines/{pipelineId}/runs/{runId}/artifacts",
            post_with(
                create_pipeline_run_artifacts,
                create_pipeline_run_artifacts_docs,
            ),
        )
        .with_path_items(|item| item.tag("Pipeline Runs"))
}
