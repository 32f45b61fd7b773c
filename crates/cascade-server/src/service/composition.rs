//! Workflow composition service: graph nodes, edges and the DAG invariant.
//!
//! Every mutation runs in one transaction and re-validates the whole graph
//! before commit; a rejected validation rolls the entire operation back.

use std::collections::HashSet;

use cascade_postgres::model::{
    NewWorkflowPipeline, NewWorkflowPipelineDependency, WorkflowPipeline,
    WorkflowPipelineDependency,
};
use cascade_postgres::query::{
    PipelineRepository, WorkflowPipelineRepository, WorkflowRepository,
};
use cascade_postgres::scoped_futures::ScopedFutureExt;
use cascade_postgres::PooledConnection;
use cascade_runtime::DependencyGraph;
use uuid::Uuid;

use super::state::ServiceState;
use crate::handler::request::WorkflowPipelineSpec;
use crate::handler::{Error, ErrorKind, Result};

const TRACING_TARGET: &str = "cascade_server::service::composition";

/// Service for workflow graph composition.
#[derive(Clone)]
pub struct WorkflowCompositionService {
    state: ServiceState,
}

impl WorkflowCompositionService {
    /// Creates the service over the shared application state.
    pub fn new(state: &ServiceState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Adds a node (plus its requested edges) to a workflow.
    pub async fn create_workflow_pipeline(
        &self,
        workflow_id: Uuid,
        spec: WorkflowPipelineSpec,
    ) -> Result<(WorkflowPipeline, Vec<WorkflowPipelineDependency>)> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let result = conn
            .transaction::<_, Error<'static>, _>(|conn| {
                let spec = &spec;
                async move {
                    let Some(workflow) = conn.find_workflow_by_id(workflow_id).await? else {
                        return Err(ErrorKind::NotFound
                            .with_message("Workflow not found")
                            .with_resource("workflow"));
                    };

                    resolve_pipeline(conn, spec.pipeline_uuid).await?;
                    let sources = spec.deduped_sources();
                    let destinations = spec.deduped_destinations();
                    resolve_nodes(conn, workflow.id, sources.iter().chain(&destinations)).await?;

                    let node = conn
                        .create_workflow_pipeline(NewWorkflowPipeline {
                            workflow_id: workflow.id,
                            pipeline_id: spec.pipeline_uuid,
                        })
                        .await?;

                    for source in &sources {
                        conn.create_workflow_dependency(NewWorkflowPipelineDependency {
                            from_workflow_pipeline_id: *source,
                            to_workflow_pipeline_id: node.id,
                        })
                        .await?;
                    }
                    for destination in &destinations {
                        conn.create_workflow_dependency(NewWorkflowPipelineDependency {
                            from_workflow_pipeline_id: node.id,
                            to_workflow_pipeline_id: *destination,
                        })
                        .await?;
                    }

                    let edges = validate_dag(conn, workflow.id).await?;

                    Ok((node, edges))
                }
                .scope_boxed()
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            workflow_pipeline_id = %result.0.id,
            "Workflow pipeline created"
        );

        Ok(result)
    }

    /// Reconciles a node's pipeline binding and incident edges to a spec.
    pub async fn update_workflow_pipeline(
        &self,
        workflow_id: Uuid,
        workflow_pipeline_id: Uuid,
        spec: WorkflowPipelineSpec,
    ) -> Result<(WorkflowPipeline, Vec<WorkflowPipelineDependency>)> {
        let mut conn = self.state.pg_client().get_connection().await?;

        let result = conn
            .transaction::<_, Error<'static>, _>(|conn| {
                let spec = &spec;
                async move {
                    let Some(workflow) = conn.find_workflow_by_id(workflow_id).await? else {
                        return Err(ErrorKind::NotFound
                            .with_message("Workflow not found")
                            .with_resource("workflow"));
                    };
                    let Some(node) = conn
                        .find_workflow_pipeline(workflow.id, workflow_pipeline_id)
                        .await?
                    else {
                        return Err(ErrorKind::NotFound
                            .with_message("Workflow pipeline not found")
                            .with_resource("workflow_pipeline"));
                    };

                    resolve_pipeline(conn, spec.pipeline_uuid).await?;
                    let desired_sources = spec.deduped_sources();
                    let desired_destinations = spec.deduped_destinations();
                    resolve_nodes(
                        conn,
                        workflow.id,
                        desired_sources.iter().chain(&desired_destinations),
                    )
                    .await?;

                    let incident = conn.list_incident_dependencies(node.id).await?;
                    let current_sources: HashSet<Uuid> = incident
                        .iter()
                        .filter(|edge| edge.to_workflow_pipeline_id == node.id)
                        .map(|edge| edge.from_workflow_pipeline_id)
                        .collect();
                    let current_destinations: HashSet<Uuid> = incident
                        .iter()
                        .filter(|edge| edge.from_workflow_pipeline_id == node.id)
                        .map(|edge| edge.to_workflow_pipeline_id)
                        .collect();

                    let desired_source_set: HashSet<Uuid> =
                        desired_sources.iter().copied().collect();
                    let desired_destination_set: HashSet<Uuid> =
                        desired_destinations.iter().copied().collect();

                    for removed in current_sources.difference(&desired_source_set) {
                        conn.delete_workflow_dependency(*removed, node.id).await?;
                    }
                    for removed in current_destinations.difference(&desired_destination_set) {
                        conn.delete_workflow_dependency(node.id, *removed).await?;
                    }
                    for added in desired_source_set.difference(&current_sources) {
                        conn.create_workflow_dependency(NewWorkflowPipelineDependency {
                            from_workflow_pipeline_id: *added,
                            to_workflow_pipeline_id: node.id,
                        })
                        .await?;
                    }
                    for added in desired_destination_set.difference(&current_destinations) {
                        conn.create_workflow_dependency(NewWorkflowPipelineDependency {
                            from_workflow_pipeline_id: node.id,
                            to_workflow_pipeline_id: *added,
                        })
                        .await?;
                    }

                    let node = if node.pipeline_id == spec.pipeline_uuid {
                        node
                    } else {
                        conn.update_workflow_pipeline_binding(node.id, spec.pipeline_uuid)
                            .await?
                    };

                    let edges = validate_dag(conn, workflow.id).await?;

                    Ok((node, edges))
                }
                .scope_boxed()
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            workflow_pipeline_id = %workflow_pipeline_id,
            "Workflow pipeline updated"
        );

        Ok(result)
    }

    /// Soft-deletes a node and drops its incident edges.
    ///
    /// The edge delete and the node soft-delete land together or not at
    /// all; a half-deleted node would be invisible to the DAG validator
    /// while still live for runs.
    pub async fn delete_workflow_pipeline(
        &self,
        workflow_id: Uuid,
        workflow_pipeline_id: Uuid,
    ) -> Result<()> {
        let mut conn = self.state.pg_client().get_connection().await?;

        conn.transaction::<_, Error<'static>, _>(|conn| {
            async move {
                let Some(node) = conn
                    .find_workflow_pipeline(workflow_id, workflow_pipeline_id)
                    .await?
                else {
                    return Err(ErrorKind::NotFound
                        .with_message("Workflow pipeline not found")
                        .with_resource("workflow_pipeline"));
                };

                conn.delete_workflow_pipeline(node.id).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id = %workflow_id,
            workflow_pipeline_id = %workflow_pipeline_id,
            "Workflow pipeline deleted"
        );

        Ok(())
    }
}

/// Rejects specs naming an unknown or deleted pipeline.
async fn resolve_pipeline(conn: &mut PooledConnection, pipeline_id: Uuid) -> Result<()> {
    if conn.find_pipeline_by_id(pipeline_id).await?.is_none() {
        return Err(ErrorKind::BadRequest
            .with_message("Unknown pipeline referenced")
            .with_resource("pipeline")
            .with_context(pipeline_id.to_string()));
    }
    Ok(())
}

/// Rejects specs naming nodes outside the workflow (or deleted ones).
async fn resolve_nodes(
    conn: &mut PooledConnection,
    workflow_id: Uuid,
    node_ids: impl Iterator<Item = &Uuid>,
) -> Result<()> {
    for node_id in node_ids {
        if conn
            .find_workflow_pipeline(workflow_id, *node_id)
            .await?
            .is_none()
        {
            return Err(ErrorKind::BadRequest
                .with_message("Unknown workflow pipeline referenced")
                .with_resource("workflow_pipeline")
                .with_context(node_id.to_string()));
        }
    }
    Ok(())
}

/// Re-validates the workflow's live graph; returns its current edge list.
async fn validate_dag(
    conn: &mut PooledConnection,
    workflow_id: Uuid,
) -> Result<Vec<WorkflowPipelineDependency>> {
    let nodes = conn.list_workflow_pipelines(workflow_id).await?;
    let edges = conn.list_workflow_dependencies(workflow_id).await?;

    let node_ids: Vec<Uuid> = nodes.iter().map(|node| node.id).collect();
    let edge_pairs: Vec<(Uuid, Uuid)> = edges
        .iter()
        .map(|edge| (edge.from_workflow_pipeline_id, edge.to_workflow_pipeline_id))
        .collect();

    let graph = DependencyGraph::new(&node_ids, &edge_pairs)?;
    graph.ensure_acyclic()?;

    Ok(edges)
}
