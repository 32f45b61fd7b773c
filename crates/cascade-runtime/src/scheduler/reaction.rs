//! The scheduler's output: a plan of effects to apply in one transaction.

use cascade_postgres::types::RunState;
use uuid::Uuid;

/// An artifact to copy into a downstream run as an input.
///
/// Carries everything needed to derive the object-store key and mint a
/// presigned URL without further lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCopy {
    /// Artifact to copy.
    pub artifact_id: Uuid,
    /// Artifact filename (becomes the input filename).
    pub name: String,
    /// Pipeline of the producing run.
    pub source_pipeline_id: Uuid,
    /// Run that produced the artifact.
    pub source_pipeline_run_id: Uuid,
    /// Run that receives the input.
    pub target_pipeline_run_id: Uuid,
}

/// Everything a single scheduler reaction wants to change.
///
/// The service layer applies the whole plan inside one transaction over the
/// workflow-run aggregate and dispatches `starts` only after commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reaction {
    /// Pipeline-run state appends (run id, new state), mostly cancellations.
    pub run_transitions: Vec<(Uuid, RunState)>,
    /// Artifact-to-input copies across completed edges.
    pub artifact_copies: Vec<ArtifactCopy>,
    /// Pipeline runs to start: append `NOT_STARTED` and dispatch post-commit.
    pub starts: Vec<Uuid>,
    /// Workflow-run state append, when the aggregate state moves.
    pub workflow_transition: Option<RunState>,
}

impl Reaction {
    /// Returns whether the reaction changes nothing.
    pub fn is_empty(&self) -> bool {
        self.run_transitions.is_empty()
            && self.artifact_copies.is_empty()
            && self.starts.is_empty()
            && self.workflow_transition.is_none()
    }
}
