//! Workflow pipeline (graph node) response types.

use cascade_postgres::model;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a workflow graph node with its incident edges.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPipeline {
    /// Node identifier.
    pub uuid: Uuid,
    /// Pipeline template the node executes.
    pub pipeline_uuid: Uuid,
    /// Upstream node identifiers.
    pub source_workflow_pipelines: Vec<Uuid>,
    /// Downstream node identifiers.
    pub destination_workflow_pipelines: Vec<Uuid>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl WorkflowPipeline {
    /// Builds the response from the node and its incident edges.
    ///
    /// Edges not touching the node are ignored, so callers may pass the
    /// whole workflow's edge list.
    pub fn from_parts(
        node: model::WorkflowPipeline,
        edges: &[model::WorkflowPipelineDependency],
    ) -> Self {
        let sources = edges
            .iter()
            .filter(|edge| edge.to_workflow_pipeline_id == node.id)
            .map(|edge| edge.from_workflow_pipeline_id)
            .collect();
        let destinations = edges
            .iter()
            .filter(|edge| edge.from_workflow_pipeline_id == node.id)
            .map(|edge| edge.to_workflow_pipeline_id)
            .collect();

        Self {
            uuid: node.id,
            pipeline_uuid: node.pipeline_id,
            source_workflow_pipelines: sources,
            destination_workflow_pipelines: destinations,
            created_at: node.created_at.into(),
            updated_at: node.updated_at.into(),
        }
    }
}
