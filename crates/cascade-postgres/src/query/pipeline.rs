//! Pipeline repository for managing pipeline templates.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewPipeline, Pipeline, UpdatePipeline};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for pipeline database operations.
///
/// Soft-deleted pipelines are invisible to every query here; their rows are
/// retained for auditing and their identifiers are never reissued.
pub trait PipelineRepository {
    /// Creates a new pipeline record.
    fn create_pipeline(
        &mut self,
        new_pipeline: NewPipeline,
    ) -> impl Future<Output = PgResult<Pipeline>> + Send;

    /// Finds a live pipeline by its unique identifier.
    fn find_pipeline_by_id(
        &mut self,
        pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Pipeline>>> + Send;

    /// Finds a pipeline by ID regardless of soft-deletion.
    ///
    /// Runs created before a deletion still execute against the retained
    /// template; only new references are blocked.
    fn find_pipeline_any_by_id(
        &mut self,
        pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Pipeline>>> + Send;

    /// Finds all live pipelines with the given identifiers.
    fn find_pipelines_by_ids(
        &mut self,
        pipeline_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<Pipeline>>> + Send;

    /// Lists live pipelines, newest first.
    fn list_pipelines(
        &mut self,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<Pipeline>>> + Send;

    /// Updates a live pipeline with new attributes.
    fn update_pipeline(
        &mut self,
        pipeline_id: Uuid,
        changes: UpdatePipeline,
    ) -> impl Future<Output = PgResult<Pipeline>> + Send;

    /// Soft-deletes a pipeline by setting its deletion timestamp.
    fn delete_pipeline(&mut self, pipeline_id: Uuid) -> impl Future<Output = PgResult<()>> + Send;

    /// Counts live workflow-pipeline nodes referencing a pipeline.
    ///
    /// A node only counts when its owning workflow is live too.
    fn count_live_pipeline_references(
        &mut self,
        pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<i64>> + Send;
}

impl PipelineRepository for PgConnection {
    async fn create_pipeline(&mut self, new_pipeline: NewPipeline) -> PgResult<Pipeline> {
        use schema::pipelines;

        let pipeline = diesel::insert_into(pipelines::table)
            .values(&new_pipeline)
            .returning(Pipeline::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(pipeline)
    }

    async fn find_pipeline_by_id(&mut self, pipeline_id: Uuid) -> PgResult<Option<Pipeline>> {
        use schema::pipelines::{self, dsl};

        let pipeline = pipelines::table
            .filter(dsl::id.eq(pipeline_id))
            .filter(dsl::deleted_at.is_null())
            .select(Pipeline::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(pipeline)
    }

    async fn find_pipeline_any_by_id(&mut self, pipeline_id: Uuid) -> PgResult<Option<Pipeline>> {
        use schema::pipelines::{self, dsl};

        let pipeline = pipelines::table
            .filter(dsl::id.eq(pipeline_id))
            .select(Pipeline::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(pipeline)
    }

    async fn find_pipelines_by_ids(&mut self, pipeline_ids: &[Uuid]) -> PgResult<Vec<Pipeline>> {
        use schema::pipelines::{self, dsl};

        let pipeline_list = pipelines::table
            .filter(dsl::id.eq_any(pipeline_ids))
            .filter(dsl::deleted_at.is_null())
            .select(Pipeline::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(pipeline_list)
    }

    async fn list_pipelines(&mut self, pagination: OffsetPagination) -> PgResult<Vec<Pipeline>> {
        use schema::pipelines::{self, dsl};

        let pipeline_list = pipelines::table
            .filter(dsl::deleted_at.is_null())
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(Pipeline::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(pipeline_list)
    }

    async fn update_pipeline(
        &mut self,
        pipeline_id: Uuid,
        changes: UpdatePipeline,
    ) -> PgResult<Pipeline> {
        use schema::pipelines::{self, dsl};

        let pipeline = diesel::update(pipelines::table)
            .filter(dsl::id.eq(pipeline_id))
            .filter(dsl::deleted_at.is_null())
            .set(&changes)
            .returning(Pipeline::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(pipeline)
    }

    async fn delete_pipeline(&mut self, pipeline_id: Uuid) -> PgResult<()> {
        use diesel::dsl::now;
        use schema::pipelines::{self, dsl};

        diesel::update(pipelines::table)
            .filter(dsl::id.eq(pipeline_id))
            .filter(dsl::deleted_at.is_null())
            .set(dsl::deleted_at.eq(now.into_sql::<diesel::sql_types::Timestamptz>().nullable()))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn count_live_pipeline_references(&mut self, pipeline_id: Uuid) -> PgResult<i64> {
        use schema::{workflow_pipelines, workflows};

        let count = workflow_pipelines::table
            .inner_join(workflows::table)
            .filter(workflow_pipelines::pipeline_id.eq(pipeline_id))
            .filter(workflow_pipelines::deleted_at.is_null())
            .filter(workflows::deleted_at.is_null())
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(count)
    }
}
