//! In-memory workflow-run aggregate.
//!
//! The scheduler never navigates lazy relations: the service layer fetches
//! the whole aggregate (run, node bindings, per-run head state, artifacts,
//! copied-input sources, workflow edges) up front and hands it over as a
//! [`RunSnapshot`].

use std::collections::HashSet;

use cascade_postgres::types::RunState;
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::DependencyGraph;

/// A reference to an artifact produced by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Artifact identifier.
    pub id: Uuid,
    /// Sanitised artifact filename.
    pub name: String,
}

/// One workflow-pipeline node of a workflow run, with its pipeline run.
#[derive(Debug, Clone)]
pub struct NodeRun {
    /// Workflow pipeline (graph node) identifier.
    pub workflow_pipeline_id: Uuid,
    /// Pipeline run bound to this node.
    pub pipeline_run_id: Uuid,
    /// Pipeline template the run executes (part of the artifact key).
    pub pipeline_id: Uuid,
    /// Current state of the pipeline run.
    pub state: RunState,
    /// Artifacts the run has produced so far.
    pub artifacts: Vec<ArtifactRef>,
    /// Source artifacts already copied into this run's inputs.
    pub copied_artifact_ids: HashSet<Uuid>,
}

/// The full workflow-run aggregate the scheduler operates on.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    /// Workflow run identifier.
    pub workflow_run_id: Uuid,
    /// Current state of the workflow run.
    pub state: RunState,
    /// One entry per workflow pipeline of the workflow at run creation.
    pub nodes: Vec<NodeRun>,
    /// Directed edges between workflow pipelines.
    pub edges: Vec<(Uuid, Uuid)>,
}

impl RunSnapshot {
    /// Finds the node executing a given pipeline run.
    pub fn node_for_pipeline_run(&self, pipeline_run_id: Uuid) -> WorkflowResult<&NodeRun> {
        self.nodes
            .iter()
            .find(|node| node.pipeline_run_id == pipeline_run_id)
            .ok_or(WorkflowError::UnknownPipelineRun(pipeline_run_id))
    }

    /// Finds a node by its workflow-pipeline id.
    pub fn node(&self, workflow_pipeline_id: Uuid) -> Option<&NodeRun> {
        self.nodes
            .iter()
            .find(|node| node.workflow_pipeline_id == workflow_pipeline_id)
    }

    /// Builds the dependency graph over this snapshot's nodes.
    pub fn graph(&self) -> WorkflowResult<DependencyGraph> {
        let node_ids: Vec<Uuid> = self
            .nodes
            .iter()
            .map(|node| node.workflow_pipeline_id)
            .collect();

        DependencyGraph::new(&node_ids, &self.edges)
    }

    /// Returns whether every pipeline run in the snapshot is terminal.
    pub fn all_terminal(&self) -> bool {
        self.nodes.iter().all(|node| node.state.is_terminal())
    }
}
