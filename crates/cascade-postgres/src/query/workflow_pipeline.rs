//! Workflow pipeline repository: graph nodes and dependency edges.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{
    NewWorkflowPipeline, NewWorkflowPipelineDependency, WorkflowPipeline,
    WorkflowPipelineDependency,
};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for workflow graph nodes and edges.
///
/// Nodes soft-delete; edges are plain join rows that are deleted outright
/// when reconciled away or when an endpoint node dies.
pub trait WorkflowPipelineRepository {
    /// Creates a new workflow pipeline node.
    fn create_workflow_pipeline(
        &mut self,
        new_node: NewWorkflowPipeline,
    ) -> impl Future<Output = PgResult<WorkflowPipeline>> + Send;

    /// Finds a live node by ID within a specific workflow.
    fn find_workflow_pipeline(
        &mut self,
        workflow_id: Uuid,
        workflow_pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<WorkflowPipeline>>> + Send;

    /// Lists the live nodes of a workflow in creation order.
    fn list_workflow_pipelines(
        &mut self,
        workflow_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<WorkflowPipeline>>> + Send;

    /// Rebinds a node to a different pipeline template.
    fn update_workflow_pipeline_binding(
        &mut self,
        workflow_pipeline_id: Uuid,
        pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<WorkflowPipeline>> + Send;

    /// Soft-deletes a node and hard-deletes its incident edges.
    fn delete_workflow_pipeline(
        &mut self,
        workflow_pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Inserts a dependency edge; duplicate edges coalesce silently.
    fn create_workflow_dependency(
        &mut self,
        new_edge: NewWorkflowPipelineDependency,
    ) -> impl Future<Output = PgResult<Option<WorkflowPipelineDependency>>> + Send;

    /// Deletes a specific dependency edge.
    fn delete_workflow_dependency(
        &mut self,
        from_workflow_pipeline_id: Uuid,
        to_workflow_pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Lists the edges between the live nodes of a workflow.
    fn list_workflow_dependencies(
        &mut self,
        workflow_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<WorkflowPipelineDependency>>> + Send;

    /// Lists the edges whose endpoints are both in the given node set.
    ///
    /// Unlike [`list_workflow_dependencies`], liveness is not consulted:
    /// a running workflow run keeps scheduling over the node set captured
    /// at run creation.
    ///
    /// [`list_workflow_dependencies`]: WorkflowPipelineRepository::list_workflow_dependencies
    fn list_dependencies_among(
        &mut self,
        workflow_pipeline_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<WorkflowPipelineDependency>>> + Send;

    /// Lists the edges incident to a node (either direction).
    fn list_incident_dependencies(
        &mut self,
        workflow_pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<WorkflowPipelineDependency>>> + Send;
}

impl WorkflowPipelineRepository for PgConnection {
    async fn create_workflow_pipeline(
        &mut self,
        new_node: NewWorkflowPipeline,
    ) -> PgResult<WorkflowPipeline> {
        use schema::workflow_pipelines;

        let node = diesel::insert_into(workflow_pipelines::table)
            .values(&new_node)
            .returning(WorkflowPipeline::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(node)
    }

    async fn find_workflow_pipeline(
        &mut self,
        workflow_id: Uuid,
        workflow_pipeline_id: Uuid,
    ) -> PgResult<Option<WorkflowPipeline>> {
        use schema::workflow_pipelines::{self, dsl};

        let node = workflow_pipelines::table
            .filter(dsl::id.eq(workflow_pipeline_id))
            .filter(dsl::workflow_id.eq(workflow_id))
            .filter(dsl::deleted_at.is_null())
            .select(WorkflowPipeline::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(node)
    }

    async fn list_workflow_pipelines(
        &mut self,
        workflow_id: Uuid,
    ) -> PgResult<Vec<WorkflowPipeline>> {
        use schema::workflow_pipelines::{self, dsl};

        let nodes = workflow_pipelines::table
            .filter(dsl::workflow_id.eq(workflow_id))
            .filter(dsl::deleted_at.is_null())
            .order(dsl::created_at.asc())
            .select(WorkflowPipeline::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(nodes)
    }

    async fn update_workflow_pipeline_binding(
        &mut self,
        workflow_pipeline_id: Uuid,
        pipeline_id: Uuid,
    ) -> PgResult<WorkflowPipeline> {
        use schema::workflow_pipelines::{self, dsl};

        let node = diesel::update(workflow_pipelines::table)
            .filter(dsl::id.eq(workflow_pipeline_id))
            .filter(dsl::deleted_at.is_null())
            .set(dsl::pipeline_id.eq(pipeline_id))
            .returning(WorkflowPipeline::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(node)
    }

    async fn delete_workflow_pipeline(&mut self, workflow_pipeline_id: Uuid) -> PgResult<()> {
        use diesel::dsl::now;
        use schema::{workflow_pipeline_dependencies, workflow_pipelines};

        diesel::delete(workflow_pipeline_dependencies::table)
            .filter(
                workflow_pipeline_dependencies::from_workflow_pipeline_id
                    .eq(workflow_pipeline_id)
                    .or(workflow_pipeline_dependencies::to_workflow_pipeline_id
                        .eq(workflow_pipeline_id)),
            )
            .execute(self)
            .await
            .map_err(PgError::from)?;

        diesel::update(workflow_pipelines::table)
            .filter(workflow_pipelines::id.eq(workflow_pipeline_id))
            .filter(workflow_pipelines::deleted_at.is_null())
            .set(workflow_pipelines::deleted_at.eq(now.into_sql::<diesel::sql_types::Timestamptz>().nullable()))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn create_workflow_dependency(
        &mut self,
        new_edge: NewWorkflowPipelineDependency,
    ) -> PgResult<Option<WorkflowPipelineDependency>> {
        use schema::workflow_pipeline_dependencies::{self, dsl};

        let edge = diesel::insert_into(workflow_pipeline_dependencies::table)
            .values(&new_edge)
            .on_conflict((dsl::from_workflow_pipeline_id, dsl::to_workflow_pipeline_id))
            .do_nothing()
            .returning(WorkflowPipelineDependency::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(edge)
    }

    async fn delete_workflow_dependency(
        &mut self,
        from_workflow_pipeline_id: Uuid,
        to_workflow_pipeline_id: Uuid,
    ) -> PgResult<()> {
        use schema::workflow_pipeline_dependencies::{self, dsl};

        diesel::delete(workflow_pipeline_dependencies::table)
            .filter(dsl::from_workflow_pipeline_id.eq(from_workflow_pipeline_id))
            .filter(dsl::to_workflow_pipeline_id.eq(to_workflow_pipeline_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn list_workflow_dependencies(
        &mut self,
        workflow_id: Uuid,
    ) -> PgResult<Vec<WorkflowPipelineDependency>> {
        use schema::workflow_pipeline_dependencies::{self, dsl};
        use schema::workflow_pipelines;

        let live_nodes = workflow_pipelines::table
            .filter(workflow_pipelines::workflow_id.eq(workflow_id))
            .filter(workflow_pipelines::deleted_at.is_null())
            .select(workflow_pipelines::id);

        let edges = workflow_pipeline_dependencies::table
            .filter(dsl::from_workflow_pipeline_id.eq_any(live_nodes.clone()))
            .filter(dsl::to_workflow_pipeline_id.eq_any(live_nodes))
            .order(dsl::created_at.asc())
            .select(WorkflowPipelineDependency::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(edges)
    }

    async fn list_dependencies_among(
        &mut self,
        workflow_pipeline_ids: &[Uuid],
    ) -> PgResult<Vec<WorkflowPipelineDependency>> {
        use schema::workflow_pipeline_dependencies::{self, dsl};

        let edges = workflow_pipeline_dependencies::table
            .filter(dsl::from_workflow_pipeline_id.eq_any(workflow_pipeline_ids))
            .filter(dsl::to_workflow_pipeline_id.eq_any(workflow_pipeline_ids))
            .order(dsl::created_at.asc())
            .select(WorkflowPipelineDependency::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(edges)
    }

    async fn list_incident_dependencies(
        &mut self,
        workflow_pipeline_id: Uuid,
    ) -> PgResult<Vec<WorkflowPipelineDependency>> {
        use schema::workflow_pipeline_dependencies::{self, dsl};

        let edges = workflow_pipeline_dependencies::table
            .filter(
                dsl::from_workflow_pipeline_id
                    .eq(workflow_pipeline_id)
                    .or(dsl::to_workflow_pipeline_id.eq(workflow_pipeline_id)),
            )
            .order(dsl::created_at.asc())
            .select(WorkflowPipelineDependency::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(edges)
    }
}
