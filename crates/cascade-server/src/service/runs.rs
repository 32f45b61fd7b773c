//! Pipeline run service: creation, starting, state updates, console output
//! and artifacts.

use cascade_nats::{ExecuteInput, ExecuteRequest};
use cascade_opendal::ArtifactKey;
use cascade_postgres::model::{
    NewPipelineRun, NewPipelineRunArtifact, NewPipelineRunInput, NewPipelineRunState, Pipeline,
    PipelineRun, PipelineRunArtifact, PipelineRunInput, PipelineRunState, UpdatePipelineRun,
};
use cascade_postgres::query::{PipelineRepository, PipelineRunRepository, WorkflowRunRepository};
use cascade_postgres::scoped_futures::ScopedFutureExt;
use cascade_postgres::types::RunState;
use cascade_postgres::PooledConnection;
use cascade_runtime::{Transition, validate_transition};
use ipnet::IpNet;
use uuid::Uuid;

use super::callback::StateCallback;
use super::dispatch::PostCommit;
use super::scheduler;
use super::state::ServiceState;
use crate::handler::request::{CreatePipelineRun, UpdateRunConsole};
use crate::handler::{Error, ErrorKind, Result};

const TRACING_TARGET: &str = "cascade_server::service::runs";

/// The fully loaded pieces of one pipeline run.
pub struct PipelineRunDetail {
    /// The run head row.
    pub run: PipelineRun,
    /// Inputs in attachment order.
    pub inputs: Vec<PipelineRunInput>,
    /// State log in recording order.
    pub states: Vec<PipelineRunState>,
    /// Artifacts paired with presigned URLs.
    pub artifacts: Vec<(PipelineRunArtifact, String)>,
}

/// Service for individual pipeline runs.
#[derive(Clone)]
pub struct PipelineRunService {
    state: ServiceState,
}

impl PipelineRunService {
    /// Creates the service over the shared application state.
    pub fn new(state: &ServiceState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Creates a run for a pipeline and, unless `queued`, starts it.
    pub async fn create_run(
        &self,
        pipeline_id: Uuid,
        request: CreatePipelineRun,
    ) -> Result<PipelineRunDetail> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let Some(pipeline) = conn.find_pipeline_by_id(pipeline_id).await? else {
            return Err(ErrorKind::NotFound
                .with_message("Pipeline not found")
                .with_resource("pipeline"));
        };

        let mut post = PostCommit::new();

        let detail = conn
            .transaction::<_, Error<'static>, _>(|conn| {
                let post = &mut post;
                let pipeline = &pipeline;
                let request = &request;
                async move {
                    let sequence = conn.next_run_sequence(pipeline.id).await?;
                    let run = conn
                        .create_pipeline_run(NewPipelineRun {
                            pipeline_id: pipeline.id,
                            sequence,
                            callback_url: request.callback_url.clone(),
                        })
                        .await?;

                    for input in &request.inputs {
                        conn.create_pipeline_run_input(NewPipelineRunInput {
                            pipeline_run_id: run.id,
                            filename: input.name.clone(),
                            url: input.url.clone(),
                            source_artifact_id: None,
                        })
                        .await?;
                    }

                    conn.append_pipeline_run_state(NewPipelineRunState::new(
                        run.id,
                        RunState::Queued,
                    ))
                    .await?;

                    if !request.queued {
                        start_pipeline_run(conn, pipeline, run.id, post).await?;
                    }

                    let inputs = conn.list_pipeline_run_inputs(run.id).await?;
                    let states = conn.list_pipeline_run_states(run.id).await?;

                    Ok(PipelineRunDetail {
                        run,
                        inputs,
                        states,
                        artifacts: Vec::new(),
                    })
                }
                .scope_boxed()
            })
            .await?;

        post.run(&self.state).await;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %pipeline_id,
            pipeline_run_id = %detail.run.id,
            sequence = detail.run.sequence,
            queued = request.queued,
            "Pipeline run created"
        );

        Ok(detail)
    }

    /// Applies an executor state callback to a run.
    ///
    /// Enforces the transition registry, maintains the head-row timestamps,
    /// notifies the creator's callback URL and, when the run belongs to a
    /// workflow run, reacts over the whole aggregate in the same
    /// transaction.
    pub async fn update_state(
        &self,
        pipeline_id: Uuid,
        run_id: Uuid,
        new_state: RunState,
        worker_ip: Option<IpNet>,
    ) -> Result<PipelineRun> {
        let mut conn = self.state.pg_client().get_connection().await?;
        let mut post = PostCommit::new();
        let state = &self.state;

        let run = conn
            .transaction::<_, Error<'static>, _>(|conn| {
                let post = &mut post;
                async move {
                    let Some(run) = conn.find_pipeline_run(pipeline_id, run_id).await? else {
                        return Err(ErrorKind::NotFound
                            .with_message("Pipeline run not found")
                            .with_resource("pipeline_run"));
                    };

                    // Serialise against concurrent reactions before reading
                    // the current state.
                    let binding = conn.find_binding_for_pipeline_run(run.id).await?;
                    if let Some(ref binding) = binding {
                        conn.lock_workflow_run(binding.workflow_run_id).await?;
                    }

                    let current = conn
                        .current_pipeline_run_state(run.id)
                        .await?
                        .map(|entry| entry.state)
                        .unwrap_or_default();

                    let transition = validate_transition(current, new_state)?;
                    let Transition::Apply(next) = transition else {
                        return Ok(run);
                    };

                    conn.append_pipeline_run_state(NewPipelineRunState::new(run.id, next))
                        .await?;

                    let mut changes = UpdatePipelineRun::default();
                    if next == RunState::Running && run.started_at.is_none() {
                        changes.started_at = Some(jiff::Timestamp::now().into());
                    }
                    if next.is_terminal() {
                        changes.completed_at = Some(jiff::Timestamp::now().into());
                    }
                    if worker_ip.is_some() && run.worker_ip.is_none() {
                        changes.worker_ip = worker_ip;
                    }
                    let run = conn.update_pipeline_run(run.id, changes).await?;

                    if let Some(ref url) = run.callback_url {
                        post.notify(
                            url.clone(),
                            StateCallback {
                                pipeline_run_uuid: run.id,
                                state: next,
                                code: next.code(),
                            },
                        );
                    }

                    if let Some(binding) = binding {
                        scheduler::react_to_pipeline_run(
                            conn,
                            state,
                            binding.workflow_run_id,
                            run.id,
                            post,
                        )
                        .await?;
                    }

                    Ok(run)
                }
                .scope_boxed()
            })
            .await?;

        post.run(&self.state).await;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_run_id = %run.id,
            state = %new_state,
            "Pipeline run state updated"
        );

        Ok(run)
    }

    /// Stores captured console streams; last writer wins.
    pub async fn update_console(
        &self,
        pipeline_id: Uuid,
        run_id: Uuid,
        console: UpdateRunConsole,
    ) -> Result<PipelineRun> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let Some(run) = conn.find_pipeline_run(pipeline_id, run_id).await? else {
            return Err(ErrorKind::NotFound
                .with_message("Pipeline run not found")
                .with_resource("pipeline_run"));
        };

        let run = conn
            .update_pipeline_run(
                run.id,
                UpdatePipelineRun {
                    stdout: Some(console.stdout),
                    stderr: Some(console.stderr),
                    ..Default::default()
                },
            )
            .await?;

        Ok(run)
    }

    /// Ingests an uploaded artifact: sanitise, upload, record metadata.
    pub async fn create_artifact(
        &self,
        pipeline_id: Uuid,
        run_id: Uuid,
        filename: &str,
        data: bytes::Bytes,
    ) -> Result<(PipelineRunArtifact, String)> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let Some(run) = conn.find_pipeline_run(pipeline_id, run_id).await? else {
            return Err(ErrorKind::NotFound
                .with_message("Pipeline run not found")
                .with_resource("pipeline_run"));
        };

        let artifact_id = Uuid::new_v4();
        let key = ArtifactKey::new(run.pipeline_id, run.id, artifact_id, filename);

        self.state.storage().write(&key, data).await?;

        let artifact = conn
            .create_pipeline_run_artifact(NewPipelineRunArtifact {
                id: artifact_id,
                pipeline_run_id: run.id,
                name: key.name.clone(),
            })
            .await?;

        let url = self.state.storage().presign_read(&key).await?;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_run_id = %run.id,
            artifact_id = %artifact.id,
            name = %artifact.name,
            "Artifact recorded"
        );

        Ok((artifact, url))
    }

    /// Loads one run with all owned collections and presigned artifacts.
    pub async fn get_run_detail(
        &self,
        pipeline_id: Uuid,
        run_id: Uuid,
    ) -> Result<PipelineRunDetail> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let Some(run) = conn.find_pipeline_run(pipeline_id, run_id).await? else {
            return Err(ErrorKind::NotFound
                .with_message("Pipeline run not found")
                .with_resource("pipeline_run"));
        };

        self.load_detail(&mut conn, run).await
    }

    /// Assembles a [`PipelineRunDetail`] for an already-fetched run.
    pub(crate) async fn load_detail(
        &self,
        conn: &mut PooledConnection,
        run: PipelineRun,
    ) -> Result<PipelineRunDetail> {
        let inputs = conn.list_pipeline_run_inputs(run.id).await?;
        let states = conn.list_pipeline_run_states(run.id).await?;
        let artifact_rows = conn.list_pipeline_run_artifacts(run.id).await?;

        let mut artifacts = Vec::with_capacity(artifact_rows.len());
        for artifact in artifact_rows {
            let key = ArtifactKey {
                pipeline_id: run.pipeline_id,
                pipeline_run_id: run.id,
                artifact_id: artifact.id,
                name: artifact.name.clone(),
            };
            let url = self.state.storage().presign_read(&key).await?;
            artifacts.push((artifact, url));
        }

        Ok(PipelineRunDetail {
            run,
            inputs,
            states,
            artifacts,
        })
    }
}

/// Starts a queued pipeline run.
///
/// Appends `NOT_STARTED` and records the executor dispatch intent with the
/// run's inputs as of this transaction. Starting an already-`NOT_STARTED`
/// run is a no-op so replayed reactions stay safe; any other state rejects
/// with `InvalidTransition`.
pub(crate) async fn start_pipeline_run(
    conn: &mut PooledConnection,
    pipeline: &Pipeline,
    run_id: Uuid,
    post: &mut PostCommit,
) -> Result<()> {
    let current = conn
        .current_pipeline_run_state(run_id)
        .await?
        .map(|entry| entry.state)
        .unwrap_or_default();

    match validate_transition(current, RunState::NotStarted)? {
        Transition::Noop => return Ok(()),
        Transition::Apply(next) => {
            conn.append_pipeline_run_state(NewPipelineRunState::new(run_id, next))
                .await?;
        }
    }

    let inputs = conn.list_pipeline_run_inputs(run_id).await?;

    post.dispatch(ExecuteRequest {
        pipeline_id: pipeline.id,
        pipeline_run_id: run_id,
        inputs: inputs
            .into_iter()
            .map(|input| ExecuteInput {
                name: input.filename,
                url: input.url,
            })
            .collect(),
        docker_image_url: pipeline.docker_image_url.clone(),
        repository_ssh_url: pipeline.repository_ssh_url.clone(),
        repository_branch: pipeline.repository_branch.clone(),
    });

    Ok(())
}
