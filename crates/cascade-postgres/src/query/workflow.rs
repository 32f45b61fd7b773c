//! Workflow repository for managing workflow compositions.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewWorkflow, UpdateWorkflow, Workflow};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for workflow database operations.
pub trait WorkflowRepository {
    /// Creates a new workflow record.
    fn create_workflow(
        &mut self,
        new_workflow: NewWorkflow,
    ) -> impl Future<Output = PgResult<Workflow>> + Send;

    /// Finds a live workflow by its unique identifier.
    fn find_workflow_by_id(
        &mut self,
        workflow_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Workflow>>> + Send;

    /// Lists live workflows, newest first.
    fn list_workflows(
        &mut self,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<Workflow>>> + Send;

    /// Updates a live workflow with new attributes.
    fn update_workflow(
        &mut self,
        workflow_id: Uuid,
        changes: UpdateWorkflow,
    ) -> impl Future<Output = PgResult<Workflow>> + Send;

    /// Soft-deletes a workflow and all of its workflow pipelines.
    ///
    /// Dependency edges between the cascaded nodes become implicitly dead.
    fn delete_workflow(&mut self, workflow_id: Uuid) -> impl Future<Output = PgResult<()>> + Send;
}

impl WorkflowRepository for PgConnection {
    async fn create_workflow(&mut self, new_workflow: NewWorkflow) -> PgResult<Workflow> {
        use schema::workflows;

        let workflow = diesel::insert_into(workflows::table)
            .values(&new_workflow)
            .returning(Workflow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(workflow)
    }

    async fn find_workflow_by_id(&mut self, workflow_id: Uuid) -> PgResult<Option<Workflow>> {
        use schema::workflows::{self, dsl};

        let workflow = workflows::table
            .filter(dsl::id.eq(workflow_id))
            .filter(dsl::deleted_at.is_null())
            .select(Workflow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(workflow)
    }

    async fn list_workflows(&mut self, pagination: OffsetPagination) -> PgResult<Vec<Workflow>> {
        use schema::workflows::{self, dsl};

        let workflow_list = workflows::table
            .filter(dsl::deleted_at.is_null())
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(Workflow::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(workflow_list)
    }

    async fn update_workflow(
        &mut self,
        workflow_id: Uuid,
        changes: UpdateWorkflow,
    ) -> PgResult<Workflow> {
        use schema::workflows::{self, dsl};

        let workflow = diesel::update(workflows::table)
            .filter(dsl::id.eq(workflow_id))
            .filter(dsl::deleted_at.is_null())
            .set(&changes)
            .returning(Workflow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(workflow)
    }

    async fn delete_workflow(&mut self, workflow_id: Uuid) -> PgResult<()> {
        use diesel::dsl::now;
        use schema::{workflow_pipelines, workflows};

        diesel::update(workflow_pipelines::table)
            .filter(workflow_pipelines::workflow_id.eq(workflow_id))
            .filter(workflow_pipelines::deleted_at.is_null())
            .set(workflow_pipelines::deleted_at.eq(now.into_sql::<diesel::sql_types::Timestamptz>().nullable()))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        diesel::update(workflows::table)
            .filter(workflows::id.eq(workflow_id))
            .filter(workflows::deleted_at.is_null())
            .set(workflows::deleted_at.eq(now.into_sql::<diesel::sql_types::Timestamptz>().nullable()))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }
}
