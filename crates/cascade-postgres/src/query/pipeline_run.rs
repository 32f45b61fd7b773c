//! Pipeline run repository: runs, inputs, artifacts and the state log.

use std::future::Future;

use diesel::prelude::*;
use diesel::upsert::DecoratableTarget;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{
    NewPipelineRun, NewPipelineRunArtifact, NewPipelineRunInput, NewPipelineRunState, PipelineRun,
    PipelineRunArtifact, PipelineRunInput, PipelineRunState, UpdatePipelineRun,
};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for pipeline run database operations.
///
/// The state log is append-only: entries are inserted, never mutated, and a
/// run's current state is the entry with the greatest `(created_at, id)`.
pub trait PipelineRunRepository {
    /// Creates a new pipeline run record.
    fn create_pipeline_run(
        &mut self,
        new_run: NewPipelineRun,
    ) -> impl Future<Output = PgResult<PipelineRun>> + Send;

    /// Returns the next per-pipeline sequence number (run count + 1).
    fn next_run_sequence(
        &mut self,
        pipeline_id: Uuid,
    ) -> impl Future<Output = PgResult<i32>> + Send;

    /// Finds a pipeline run by its unique identifier.
    fn find_pipeline_run_by_id(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<PipelineRun>>> + Send;

    /// Finds a run by ID scoped to a specific pipeline.
    fn find_pipeline_run(
        &mut self,
        pipeline_id: Uuid,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<PipelineRun>>> + Send;

    /// Finds several runs by their identifiers.
    fn find_pipeline_runs_by_ids(
        &mut self,
        run_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<PipelineRun>>> + Send;

    /// Lists runs of a pipeline in creation order (oldest first).
    fn list_pipeline_runs(
        &mut self,
        pipeline_id: Uuid,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<PipelineRun>>> + Send;

    /// Updates scalar fields on a run's head row.
    fn update_pipeline_run(
        &mut self,
        run_id: Uuid,
        changes: UpdatePipelineRun,
    ) -> impl Future<Output = PgResult<PipelineRun>> + Send;

    /// Appends an entry to a run's state log.
    fn append_pipeline_run_state(
        &mut self,
        new_state: NewPipelineRunState,
    ) -> impl Future<Output = PgResult<PipelineRunState>> + Send;

    /// Returns the newest state-log entry for a run.
    fn current_pipeline_run_state(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<PipelineRunState>>> + Send;

    /// Lists a run's state log in recording order.
    fn list_pipeline_run_states(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<PipelineRunState>>> + Send;

    /// Lists state logs for several runs at once, in recording order.
    fn list_states_for_runs(
        &mut self,
        run_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<PipelineRunState>>> + Send;

    /// Attaches an input to a run.
    ///
    /// Inputs copied from an artifact carry `source_artifact_id`; inserting
    /// the same source into the same run again is a no-op.
    fn create_pipeline_run_input(
        &mut self,
        new_input: NewPipelineRunInput,
    ) -> impl Future<Output = PgResult<Option<PipelineRunInput>>> + Send;

    /// Lists a run's inputs in attachment order.
    fn list_pipeline_run_inputs(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<PipelineRunInput>>> + Send;

    /// Lists inputs for several runs at once.
    fn list_inputs_for_runs(
        &mut self,
        run_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<PipelineRunInput>>> + Send;

    /// Records an artifact produced by a run.
    fn create_pipeline_run_artifact(
        &mut self,
        new_artifact: NewPipelineRunArtifact,
    ) -> impl Future<Output = PgResult<PipelineRunArtifact>> + Send;

    /// Finds an artifact by its unique identifier.
    fn find_pipeline_run_artifact(
        &mut self,
        artifact_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<PipelineRunArtifact>>> + Send;

    /// Lists a run's artifacts in creation order.
    fn list_pipeline_run_artifacts(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<PipelineRunArtifact>>> + Send;

    /// Lists artifacts for several runs at once.
    fn list_artifacts_for_runs(
        &mut self,
        run_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<PipelineRunArtifact>>> + Send;
}

impl PipelineRunRepository for PgConnection {
    async fn create_pipeline_run(&mut self, new_run: NewPipelineRun) -> PgResult<PipelineRun> {
        use schema::pipeline_runs;

        let run = diesel::insert_into(pipeline_runs::table)
            .values(&new_run)
            .returning(PipelineRun::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn next_run_sequence(&mut self, pipeline_id: Uuid) -> PgResult<i32> {
        use schema::pipeline_runs::{self, dsl};

        let count: i64 = pipeline_runs::table
            .filter(dsl::pipeline_id.eq(pipeline_id))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(count as i32 + 1)
    }

    async fn find_pipeline_run_by_id(&mut self, run_id: Uuid) -> PgResult<Option<PipelineRun>> {
        use schema::pipeline_runs::{self, dsl};

        let run = pipeline_runs::table
            .filter(dsl::id.eq(run_id))
            .select(PipelineRun::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn find_pipeline_run(
        &mut self,
        pipeline_id: Uuid,
        run_id: Uuid,
    ) -> PgResult<Option<PipelineRun>> {
        use schema::pipeline_runs::{self, dsl};

        let run = pipeline_runs::table
            .filter(dsl::id.eq(run_id))
            .filter(dsl::pipeline_id.eq(pipeline_id))
            .select(PipelineRun::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn find_pipeline_runs_by_ids(&mut self, run_ids: &[Uuid]) -> PgResult<Vec<PipelineRun>> {
        use schema::pipeline_runs::{self, dsl};

        let runs = pipeline_runs::table
            .filter(dsl::id.eq_any(run_ids))
            .select(PipelineRun::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(runs)
    }

    async fn list_pipeline_runs(
        &mut self,
        pipeline_id: Uuid,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<PipelineRun>> {
        use schema::pipeline_runs::{self, dsl};

        let runs = pipeline_runs::table
            .filter(dsl::pipeline_id.eq(pipeline_id))
            .order(dsl::sequence.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(PipelineRun::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(runs)
    }

    async fn update_pipeline_run(
        &mut self,
        run_id: Uuid,
        changes: UpdatePipelineRun,
    ) -> PgResult<PipelineRun> {
        use schema::pipeline_runs::{self, dsl};

        let run = diesel::update(pipeline_runs::table.filter(dsl::id.eq(run_id)))
            .set(&changes)
            .returning(PipelineRun::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn append_pipeline_run_state(
        &mut self,
        new_state: NewPipelineRunState,
    ) -> PgResult<PipelineRunState> {
        use schema::pipeline_run_states;

        let entry = diesel::insert_into(pipeline_run_states::table)
            .values(&new_state)
            .returning(PipelineRunState::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(entry)
    }

    async fn current_pipeline_run_state(
        &mut self,
        run_id: Uuid,
    ) -> PgResult<Option<PipelineRunState>> {
        use schema::pipeline_run_states::{self, dsl};

        let entry = pipeline_run_states::table
            .filter(dsl::pipeline_run_id.eq(run_id))
            .order((dsl::created_at.desc(), dsl::id.desc()))
            .select(PipelineRunState::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(entry)
    }

    async fn list_pipeline_run_states(&mut self, run_id: Uuid) -> PgResult<Vec<PipelineRunState>> {
        use schema::pipeline_run_states::{self, dsl};

        let entries = pipeline_run_states::table
            .filter(dsl::pipeline_run_id.eq(run_id))
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .select(PipelineRunState::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(entries)
    }

    async fn list_states_for_runs(&mut self, run_ids: &[Uuid]) -> PgResult<Vec<PipelineRunState>> {
        use schema::pipeline_run_states::{self, dsl};

        let entries = pipeline_run_states::table
            .filter(dsl::pipeline_run_id.eq_any(run_ids))
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .select(PipelineRunState::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(entries)
    }

    async fn create_pipeline_run_input(
        &mut self,
        new_input: NewPipelineRunInput,
    ) -> PgResult<Option<PipelineRunInput>> {
        use schema::pipeline_run_inputs::{self, dsl};

        let input = diesel::insert_into(pipeline_run_inputs::table)
            .values(&new_input)
            .on_conflict((dsl::pipeline_run_id, dsl::source_artifact_id))
            .filter_target(dsl::source_artifact_id.is_not_null())
            .do_nothing()
            .returning(PipelineRunInput::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(input)
    }

    async fn list_pipeline_run_inputs(&mut self, run_id: Uuid) -> PgResult<Vec<PipelineRunInput>> {
        use schema::pipeline_run_inputs::{self, dsl};

        let inputs = pipeline_run_inputs::table
            .filter(dsl::pipeline_run_id.eq(run_id))
            .order(dsl::created_at.asc())
            .select(PipelineRunInput::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(inputs)
    }

    async fn list_inputs_for_runs(&mut self, run_ids: &[Uuid]) -> PgResult<Vec<PipelineRunInput>> {
        use schema::pipeline_run_inputs::{self, dsl};

        let inputs = pipeline_run_inputs::table
            .filter(dsl::pipeline_run_id.eq_any(run_ids))
            .order(dsl::created_at.asc())
            .select(PipelineRunInput::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(inputs)
    }

    async fn create_pipeline_run_artifact(
        &mut self,
        new_artifact: NewPipelineRunArtifact,
    ) -> PgResult<PipelineRunArtifact> {
        use schema::pipeline_run_artifacts;

        let artifact = diesel::insert_into(pipeline_run_artifacts::table)
            .values(&new_artifact)
            .returning(PipelineRunArtifact::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(artifact)
    }

    async fn find_pipeline_run_artifact(
        &mut self,
        artifact_id: Uuid,
    ) -> PgResult<Option<PipelineRunArtifact>> {
        use schema::pipeline_run_artifacts::{self, dsl};

        let artifact = pipeline_run_artifacts::table
            .filter(dsl::id.eq(artifact_id))
            .select(PipelineRunArtifact::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(artifact)
    }

    async fn list_pipeline_run_artifacts(
        &mut self,
        run_id: Uuid,
    ) -> PgResult<Vec<PipelineRunArtifact>> {
        use schema::pipeline_run_artifacts::{self, dsl};

        let artifacts = pipeline_run_artifacts::table
            .filter(dsl::pipeline_run_id.eq(run_id))
            .order(dsl::created_at.asc())
            .select(PipelineRunArtifact::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(artifacts)
    }

    async fn list_artifacts_for_runs(
        &mut self,
        run_ids: &[Uuid],
    ) -> PgResult<Vec<PipelineRunArtifact>> {
        use schema::pipeline_run_artifacts::{self, dsl};

        let artifacts = pipeline_run_artifacts::table
            .filter(dsl::pipeline_run_id.eq_any(run_ids))
            .order(dsl::created_at.asc())
            .select(PipelineRunArtifact::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(artifacts)
    }
}
