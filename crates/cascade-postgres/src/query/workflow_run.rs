//! Workflow run repository: runs, node bindings, state log and locking.

use std::future::Future;

use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{
    NewWorkflowPipelineRun, NewWorkflowRun, NewWorkflowRunState, WorkflowPipelineRun, WorkflowRun,
    WorkflowRunState,
};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for workflow run database operations.
pub trait WorkflowRunRepository {
    /// Creates a new workflow run record.
    fn create_workflow_run(
        &mut self,
        new_run: NewWorkflowRun,
    ) -> impl Future<Output = PgResult<WorkflowRun>> + Send;

    /// Finds a workflow run by ID within a specific workflow.
    fn find_workflow_run(
        &mut self,
        workflow_id: Uuid,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<WorkflowRun>>> + Send;

    /// Finds a workflow run by its unique identifier.
    fn find_workflow_run_by_id(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<WorkflowRun>>> + Send;

    /// Lists runs of a workflow, newest first.
    fn list_workflow_runs(
        &mut self,
        workflow_id: Uuid,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<WorkflowRun>>> + Send;

    /// Appends an entry to a workflow run's state log.
    fn append_workflow_run_state(
        &mut self,
        new_state: NewWorkflowRunState,
    ) -> impl Future<Output = PgResult<WorkflowRunState>> + Send;

    /// Returns the newest state-log entry for a workflow run.
    fn current_workflow_run_state(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<WorkflowRunState>>> + Send;

    /// Lists a workflow run's state log in recording order.
    fn list_workflow_run_states(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<WorkflowRunState>>> + Send;

    /// Binds a workflow pipeline to its pipeline run inside a workflow run.
    fn create_workflow_pipeline_run(
        &mut self,
        new_binding: NewWorkflowPipelineRun,
    ) -> impl Future<Output = PgResult<WorkflowPipelineRun>> + Send;

    /// Lists the node bindings of a workflow run in creation order.
    fn list_workflow_pipeline_runs(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<WorkflowPipelineRun>>> + Send;

    /// Finds the node binding owning a pipeline run, if any.
    fn find_binding_for_pipeline_run(
        &mut self,
        pipeline_run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<WorkflowPipelineRun>>> + Send;

    /// Takes a transaction-scoped advisory lock on a workflow run.
    ///
    /// Serialises concurrent scheduler reactions over the same workflow-run
    /// aggregate. The lock is released at commit or rollback.
    fn lock_workflow_run(&mut self, run_id: Uuid) -> impl Future<Output = PgResult<()>> + Send;
}

/// Derives the advisory-lock key from a workflow run's UUID.
///
/// The leading 8 bytes are enough: the UUIDs are random and the lock only
/// needs to distinguish concurrently active runs.
fn advisory_lock_key(run_id: Uuid) -> i64 {
    let bytes = run_id.as_bytes();
    i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

impl WorkflowRunRepository for PgConnection {
    async fn create_workflow_run(&mut self, new_run: NewWorkflowRun) -> PgResult<WorkflowRun> {
        use schema::workflow_runs;

        let run = diesel::insert_into(workflow_runs::table)
            .values(&new_run)
            .returning(WorkflowRun::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn find_workflow_run(
        &mut self,
        workflow_id: Uuid,
        run_id: Uuid,
    ) -> PgResult<Option<WorkflowRun>> {
        use schema::workflow_runs::{self, dsl};

        let run = workflow_runs::table
            .filter(dsl::id.eq(run_id))
            .filter(dsl::workflow_id.eq(workflow_id))
            .select(WorkflowRun::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn find_workflow_run_by_id(&mut self, run_id: Uuid) -> PgResult<Option<WorkflowRun>> {
        use schema::workflow_runs::{self, dsl};

        let run = workflow_runs::table
            .filter(dsl::id.eq(run_id))
            .select(WorkflowRun::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn list_workflow_runs(
        &mut self,
        workflow_id: Uuid,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<WorkflowRun>> {
        use schema::workflow_runs::{self, dsl};

        let runs = workflow_runs::table
            .filter(dsl::workflow_id.eq(workflow_id))
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(WorkflowRun::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(runs)
    }

    async fn append_workflow_run_state(
        &mut self,
        new_state: NewWorkflowRunState,
    ) -> PgResult<WorkflowRunState> {
        use schema::workflow_run_states;

        let entry = diesel::insert_into(workflow_run_states::table)
            .values(&new_state)
            .returning(WorkflowRunState::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(entry)
    }

    async fn current_workflow_run_state(
        &mut self,
        run_id: Uuid,
    ) -> PgResult<Option<WorkflowRunState>> {
        use schema::workflow_run_states::{self, dsl};

        let entry = workflow_run_states::table
            .filter(dsl::workflow_run_id.eq(run_id))
            .order((dsl::created_at.desc(), dsl::id.desc()))
            .select(WorkflowRunState::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(entry)
    }

    async fn list_workflow_run_states(&mut self, run_id: Uuid) -> PgResult<Vec<WorkflowRunState>> {
        use schema::workflow_run_states::{self, dsl};

        let entries = workflow_run_states::table
            .filter(dsl::workflow_run_id.eq(run_id))
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .select(WorkflowRunState::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(entries)
    }

    async fn create_workflow_pipeline_run(
        &mut self,
        new_binding: NewWorkflowPipelineRun,
    ) -> PgResult<WorkflowPipelineRun> {
        use schema::workflow_pipeline_runs;

        let binding = diesel::insert_into(workflow_pipeline_runs::table)
            .values(&new_binding)
            .returning(WorkflowPipelineRun::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(binding)
    }

    async fn list_workflow_pipeline_runs(
        &mut self,
        run_id: Uuid,
    ) -> PgResult<Vec<WorkflowPipelineRun>> {
        use schema::workflow_pipeline_runs::{self, dsl};

        let bindings = workflow_pipeline_runs::table
            .filter(dsl::workflow_run_id.eq(run_id))
            .order(dsl::created_at.asc())
            .select(WorkflowPipelineRun::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(bindings)
    }

    async fn find_binding_for_pipeline_run(
        &mut self,
        pipeline_run_id: Uuid,
    ) -> PgResult<Option<WorkflowPipelineRun>> {
        use schema::workflow_pipeline_runs::{self, dsl};

        let binding = workflow_pipeline_runs::table
            .filter(dsl::pipeline_run_id.eq(pipeline_run_id))
            .select(WorkflowPipelineRun::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(binding)
    }

    async fn lock_workflow_run(&mut self, run_id: Uuid) -> PgResult<()> {
        diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
            .bind::<BigInt, _>(advisory_lock_key(run_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_lock_key_is_deterministic() {
        let run_id = Uuid::from_u128(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10);
        assert_eq!(advisory_lock_key(run_id), advisory_lock_key(run_id));
        assert_eq!(advisory_lock_key(run_id), 0x0102_0304_0506_0708_i64);
    }

    #[test]
    fn advisory_lock_key_differs_between_runs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(advisory_lock_key(a), advisory_lock_key(b));
    }
}
