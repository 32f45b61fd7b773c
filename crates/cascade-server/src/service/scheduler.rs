//! Workflow run service: run creation and the per-event reaction loop.
//!
//! The planning itself lives in `cascade_runtime::scheduler`; this module
//! loads the aggregate, applies the plan inside the surrounding transaction
//! and records post-commit dispatch intents.

use std::collections::{HashMap, HashSet};

use cascade_opendal::ArtifactKey;
use cascade_postgres::PooledConnection;
use cascade_postgres::model::{
    NewPipelineRun, NewPipelineRunInput, NewPipelineRunState, NewWorkflowPipelineRun,
    NewWorkflowRun, NewWorkflowRunState, UpdatePipelineRun, WorkflowPipelineRun, WorkflowRun,
    WorkflowRunState,
};
use cascade_postgres::query::{
    PipelineRepository, PipelineRunRepository, WorkflowPipelineRepository, WorkflowRepository,
    WorkflowRunRepository,
};
use cascade_postgres::scoped_futures::ScopedFutureExt;
use cascade_postgres::types::{OffsetPagination, RunState};
use cascade_runtime::scheduler::{self as planner, ArtifactRef, NodeRun, Reaction, RunSnapshot};
use cascade_runtime::{DependencyGraph, validate_transition, Transition};
use uuid::Uuid;

use super::dispatch::PostCommit;
use super::runs::{self, PipelineRunDetail, PipelineRunService};
use super::state::ServiceState;
use crate::handler::request::CreateWorkflowRun;
use crate::handler::{Error, ErrorKind, Result};

const TRACING_TARGET: &str = "cascade_server::service::scheduler";

/// The fully loaded pieces of one workflow run.
pub struct WorkflowRunDetail {
    /// The run head row.
    pub run: WorkflowRun,
    /// State log in recording order.
    pub states: Vec<WorkflowRunState>,
    /// Node bindings paired with their pipeline run details.
    pub nodes: Vec<(WorkflowPipelineRun, PipelineRunDetail)>,
}

/// Service for workflow runs.
#[derive(Clone)]
pub struct WorkflowRunService {
    state: ServiceState,
}

impl WorkflowRunService {
    /// Creates the service over the shared application state.
    pub fn new(state: &ServiceState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Creates a workflow run: one queued pipeline run per live node, roots
    /// started immediately.
    pub async fn create_run(
        &self,
        workflow_id: Uuid,
        request: CreateWorkflowRun,
    ) -> Result<WorkflowRunDetail> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let Some(workflow) = conn.find_workflow_by_id(workflow_id).await? else {
            return Err(ErrorKind::NotFound
                .with_message("Workflow not found")
                .with_resource("workflow"));
        };

        let mut post = PostCommit::new();

        let run_id = conn
            .transaction::<_, Error<'static>, _>(|conn| {
                let post = &mut post;
                let request = &request;
                async move {
                    let nodes = conn.list_workflow_pipelines(workflow.id).await?;
                    let edges = conn.list_workflow_dependencies(workflow.id).await?;

                    let node_ids: Vec<Uuid> = nodes.iter().map(|node| node.id).collect();
                    let edge_pairs: Vec<(Uuid, Uuid)> = edges
                        .iter()
                        .map(|edge| {
                            (edge.from_workflow_pipeline_id, edge.to_workflow_pipeline_id)
                        })
                        .collect();

                    // Defence in depth: the composition service validated
                    // every mutation, but a run must never walk a cycle.
                    let graph = DependencyGraph::new(&node_ids, &edge_pairs)?;
                    graph.ensure_acyclic()?;
                    let roots: HashSet<Uuid> = planner::plan_roots(&graph)?.into_iter().collect();

                    let workflow_run = conn
                        .create_workflow_run(NewWorkflowRun {
                            workflow_id: workflow.id,
                        })
                        .await?;
                    conn.append_workflow_run_state(NewWorkflowRunState::new(
                        workflow_run.id,
                        RunState::NotStarted,
                    ))
                    .await?;

                    let pipeline_ids: Vec<Uuid> =
                        nodes.iter().map(|node| node.pipeline_id).collect();
                    let pipelines: HashMap<Uuid, _> = conn
                        .find_pipelines_by_ids(&pipeline_ids)
                        .await?
                        .into_iter()
                        .map(|pipeline| (pipeline.id, pipeline))
                        .collect();

                    let mut root_runs = Vec::new();
                    for node in &nodes {
                        let Some(pipeline) = pipelines.get(&node.pipeline_id) else {
                            return Err(ErrorKind::BadRequest
                                .with_message("Workflow references a deleted pipeline")
                                .with_resource("pipeline"));
                        };

                        let sequence = conn.next_run_sequence(pipeline.id).await?;
                        let run = conn
                            .create_pipeline_run(NewPipelineRun {
                                pipeline_id: pipeline.id,
                                sequence,
                                callback_url: None,
                            })
                            .await?;
                        conn.append_pipeline_run_state(NewPipelineRunState::new(
                            run.id,
                            RunState::Queued,
                        ))
                        .await?;
                        conn.create_workflow_pipeline_run(NewWorkflowPipelineRun {
                            workflow_run_id: workflow_run.id,
                            workflow_pipeline_id: node.id,
                            pipeline_run_id: run.id,
                        })
                        .await?;

                        if roots.contains(&node.id) {
                            for input in &request.inputs {
                                conn.create_pipeline_run_input(NewPipelineRunInput {
                                    pipeline_run_id: run.id,
                                    filename: input.name.clone(),
                                    url: input.url.clone(),
                                    source_artifact_id: None,
                                })
                                .await?;
                            }
                            root_runs.push((pipeline.clone(), run.id));
                        }
                    }

                    for (pipeline, run_id) in &root_runs {
                        runs::start_pipeline_run(conn, pipeline, *run_id, post).await?;
                    }

                    Ok(workflow_run.id)
                }
                .scope_boxed()
            })
            .await?;

        post.run(&self.state).await;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            workflow_run_id = %run_id,
            "Workflow run created"
        );

        self.get_run(workflow_id, run_id).await
    }

    /// Loads one workflow run with its full aggregate for responses.
    pub async fn get_run(&self, workflow_id: Uuid, run_id: Uuid) -> Result<WorkflowRunDetail> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let Some(run) = conn.find_workflow_run(workflow_id, run_id).await? else {
            return Err(ErrorKind::NotFound
                .with_message("Workflow run not found")
                .with_resource("workflow_run"));
        };

        let states = conn.list_workflow_run_states(run.id).await?;
        let bindings = conn.list_workflow_pipeline_runs(run.id).await?;

        let run_service = PipelineRunService::new(&self.state);
        let mut nodes = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let Some(pipeline_run) = conn.find_pipeline_run_by_id(binding.pipeline_run_id).await?
            else {
                return Err(ErrorKind::InternalServerError
                    .with_context("workflow run references a missing pipeline run"));
            };
            let detail = run_service.load_detail(&mut conn, pipeline_run).await?;
            nodes.push((binding, detail));
        }

        Ok(WorkflowRunDetail { run, states, nodes })
    }

    /// Lists a workflow's runs, newest first.
    pub async fn list_runs(
        &self,
        workflow_id: Uuid,
        pagination: OffsetPagination,
    ) -> Result<Vec<WorkflowRun>> {
        let mut conn = self.state.pg_client().get_connection().await?;

        if conn.find_workflow_by_id(workflow_id).await?.is_none() {
            return Err(ErrorKind::NotFound
                .with_message("Workflow not found")
                .with_resource("workflow"));
        }

        let runs = conn.list_workflow_runs(workflow_id, pagination).await?;
        Ok(runs)
    }
}

/// Reacts to a pipeline-run state change inside the caller's transaction.
///
/// Takes the workflow-run advisory lock (re-entrant within the transaction),
/// loads the aggregate fresh, plans and applies.
pub(crate) async fn react_to_pipeline_run(
    conn: &mut PooledConnection,
    state: &ServiceState,
    workflow_run_id: Uuid,
    pipeline_run_id: Uuid,
    post: &mut PostCommit,
) -> Result<()> {
    conn.lock_workflow_run(workflow_run_id).await?;

    let snapshot = load_snapshot(conn, workflow_run_id).await?;
    let reaction = planner::plan_reaction(&snapshot, pipeline_run_id)?;

    if reaction.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        target: TRACING_TARGET,
        workflow_run_id = %workflow_run_id,
        pipeline_run_id = %pipeline_run_id,
        cancellations = reaction.run_transitions.len(),
        copies = reaction.artifact_copies.len(),
        starts = reaction.starts.len(),
        workflow_transition = ?reaction.workflow_transition,
        "Applying scheduler reaction"
    );

    apply_reaction(conn, state, &snapshot, reaction, post).await
}

/// Loads the full workflow-run aggregate into a planner snapshot.
async fn load_snapshot(
    conn: &mut PooledConnection,
    workflow_run_id: Uuid,
) -> Result<RunSnapshot> {
    let Some(run) = conn.find_workflow_run_by_id(workflow_run_id).await? else {
        return Err(ErrorKind::NotFound
            .with_message("Workflow run not found")
            .with_resource("workflow_run"));
    };

    let run_state = conn
        .current_workflow_run_state(run.id)
        .await?
        .map(|entry| entry.state)
        .unwrap_or(RunState::NotStarted);

    let bindings = conn.list_workflow_pipeline_runs(run.id).await?;
    let run_ids: Vec<Uuid> = bindings
        .iter()
        .map(|binding| binding.pipeline_run_id)
        .collect();
    let node_ids: Vec<Uuid> = bindings
        .iter()
        .map(|binding| binding.workflow_pipeline_id)
        .collect();

    let pipeline_runs: HashMap<Uuid, _> = conn
        .find_pipeline_runs_by_ids(&run_ids)
        .await?
        .into_iter()
        .map(|pipeline_run| (pipeline_run.id, pipeline_run))
        .collect();

    // States arrive oldest-first; the last one per run is its current state.
    let mut current_states: HashMap<Uuid, RunState> = HashMap::new();
    for entry in conn.list_states_for_runs(&run_ids).await? {
        current_states.insert(entry.pipeline_run_id, entry.state);
    }

    let mut artifacts: HashMap<Uuid, Vec<ArtifactRef>> = HashMap::new();
    for artifact in conn.list_artifacts_for_runs(&run_ids).await? {
        artifacts
            .entry(artifact.pipeline_run_id)
            .or_default()
            .push(ArtifactRef {
                id: artifact.id,
                name: artifact.name,
            });
    }

    let mut copied: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for input in conn.list_inputs_for_runs(&run_ids).await? {
        if let Some(source_artifact_id) = input.source_artifact_id {
            copied
                .entry(input.pipeline_run_id)
                .or_default()
                .insert(source_artifact_id);
        }
    }

    let edges = conn
        .list_dependencies_among(&node_ids)
        .await?
        .into_iter()
        .map(|edge| (edge.from_workflow_pipeline_id, edge.to_workflow_pipeline_id))
        .collect();

    let mut nodes = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let Some(pipeline_run) = pipeline_runs.get(&binding.pipeline_run_id) else {
            return Err(ErrorKind::InternalServerError
                .with_context("workflow run references a missing pipeline run"));
        };

        nodes.push(NodeRun {
            workflow_pipeline_id: binding.workflow_pipeline_id,
            pipeline_run_id: binding.pipeline_run_id,
            pipeline_id: pipeline_run.pipeline_id,
            state: current_states
                .get(&binding.pipeline_run_id)
                .copied()
                .unwrap_or_default(),
            artifacts: artifacts
                .remove(&binding.pipeline_run_id)
                .unwrap_or_default(),
            copied_artifact_ids: copied.remove(&binding.pipeline_run_id).unwrap_or_default(),
        });
    }

    Ok(RunSnapshot {
        workflow_run_id: run.id,
        state: run_state,
        nodes,
        edges,
    })
}

/// Applies a planned reaction: state appends, input copies, starts and the
/// workflow-run transition, all in the caller's transaction.
async fn apply_reaction(
    conn: &mut PooledConnection,
    state: &ServiceState,
    snapshot: &RunSnapshot,
    reaction: Reaction,
    post: &mut PostCommit,
) -> Result<()> {
    for (run_id, new_state) in &reaction.run_transitions {
        let current = conn
            .current_pipeline_run_state(*run_id)
            .await?
            .map(|entry| entry.state)
            .unwrap_or_default();

        match validate_transition(current, *new_state)? {
            Transition::Noop => continue,
            Transition::Apply(next) => {
                conn.append_pipeline_run_state(NewPipelineRunState::new(*run_id, next))
                    .await?;
                if next.is_terminal() {
                    conn.update_pipeline_run(
                        *run_id,
                        UpdatePipelineRun {
                            completed_at: Some(jiff::Timestamp::now().into()),
                            ..Default::default()
                        },
                    )
                    .await?;
                }
            }
        }
    }

    for copy in &reaction.artifact_copies {
        let key = ArtifactKey {
            pipeline_id: copy.source_pipeline_id,
            pipeline_run_id: copy.source_pipeline_run_id,
            artifact_id: copy.artifact_id,
            name: copy.name.clone(),
        };
        let url = state.storage().presign_read(&key).await?;

        // Duplicate copies collapse on (run, source artifact).
        conn.create_pipeline_run_input(NewPipelineRunInput {
            pipeline_run_id: copy.target_pipeline_run_id,
            filename: copy.name.clone(),
            url,
            source_artifact_id: Some(copy.artifact_id),
        })
        .await?;
    }

    for run_id in &reaction.starts {
        let node = snapshot
            .nodes
            .iter()
            .find(|node| node.pipeline_run_id == *run_id)
            .ok_or_else(|| {
                ErrorKind::InternalServerError.with_context("reaction start for unknown run")
            })?;

        // The template may have been soft-deleted mid-run; execution still
        // uses the retained row.
        let Some(pipeline) = conn.find_pipeline_any_by_id(node.pipeline_id).await? else {
            return Err(ErrorKind::InternalServerError
                .with_context("pipeline row missing for scheduled run"));
        };

        runs::start_pipeline_run(conn, &pipeline, *run_id, post).await?;
    }

    if let Some(next) = reaction.workflow_transition {
        conn.append_workflow_run_state(NewWorkflowRunState::new(snapshot.workflow_run_id, next))
            .await?;
    }

    Ok(())
}
