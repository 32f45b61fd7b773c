//! Workflow model: a named DAG of workflow pipelines.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::{workflow_pipeline_dependencies, workflow_pipelines, workflows};

/// A named, described composition of pipelines.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Workflow {
    /// Unique workflow identifier.
    pub id: Uuid,
    /// Human-readable workflow name.
    pub name: String,
    /// Description of what the workflow does.
    pub description: String,
    /// Timestamp when the workflow was created.
    pub created_at: Timestamp,
    /// Timestamp when the workflow was last updated.
    pub updated_at: Timestamp,
    /// Timestamp when the workflow was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a new workflow.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflow {
    /// Workflow name.
    pub name: String,
    /// Workflow description.
    pub description: String,
}

/// Data for updating a workflow.
#[derive(Debug, Default, Clone, AsChangeset)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateWorkflow {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

impl Workflow {
    /// Returns whether the workflow is soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A node in a workflow graph, binding one pipeline to one workflow.
///
/// A workflow may bind the same pipeline in multiple nodes.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowPipeline {
    /// Unique node identifier.
    pub id: Uuid,
    /// Workflow this node belongs to.
    pub workflow_id: Uuid,
    /// Pipeline template the node executes.
    pub pipeline_id: Uuid,
    /// Timestamp when the node was created.
    pub created_at: Timestamp,
    /// Timestamp when the node was last updated.
    pub updated_at: Timestamp,
    /// Timestamp when the node was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a new workflow pipeline node.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = workflow_pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowPipeline {
    /// Owning workflow.
    pub workflow_id: Uuid,
    /// Bound pipeline.
    pub pipeline_id: Uuid,
}

impl WorkflowPipeline {
    /// Returns whether the node is soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A directed edge between two workflow pipelines of the same workflow.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = workflow_pipeline_dependencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowPipelineDependency {
    /// Unique edge identifier.
    pub id: Uuid,
    /// Upstream node.
    pub from_workflow_pipeline_id: Uuid,
    /// Downstream node.
    pub to_workflow_pipeline_id: Uuid,
    /// Timestamp when the edge was created.
    pub created_at: Timestamp,
}

/// Data for creating a new dependency edge.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = workflow_pipeline_dependencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorkflowPipelineDependency {
    /// Upstream node.
    pub from_workflow_pipeline_id: Uuid,
    /// Downstream node.
    pub to_workflow_pipeline_id: Uuid,
}
