//! Workflow pipeline (graph node) request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request payload for creating or reconciling a workflow pipeline.
///
/// `source_workflow_pipelines` are upstream nodes (each becomes an edge
/// `source -> this`); `destination_workflow_pipelines` are downstream nodes
/// (`this -> destination`). Duplicates in either list are deduped. On
/// update, the incident edge set is reconciled to exactly match the lists.
#[must_use]
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPipelineSpec {
    /// Pipeline template the node executes.
    pub pipeline_uuid: Uuid,
    /// Upstream workflow pipelines.
    #[serde(default)]
    pub source_workflow_pipelines: Vec<Uuid>,
    /// Downstream workflow pipelines.
    #[serde(default)]
    pub destination_workflow_pipelines: Vec<Uuid>,
}

impl WorkflowPipelineSpec {
    /// Returns the source list with duplicates removed, order preserved.
    pub fn deduped_sources(&self) -> Vec<Uuid> {
        dedup_preserving_order(&self.source_workflow_pipelines)
    }

    /// Returns the destination list with duplicates removed, order preserved.
    pub fn deduped_destinations(&self) -> Vec<Uuid> {
        dedup_preserving_order(&self.destination_workflow_pipelines)
    }
}

fn dedup_preserving_order(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edges_are_deduped_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let spec = WorkflowPipelineSpec {
            pipeline_uuid: Uuid::new_v4(),
            source_workflow_pipelines: vec![a, a, b, a],
            destination_workflow_pipelines: vec![b, b],
        };

        assert_eq!(spec.deduped_sources(), vec![a, b]);
        assert_eq!(spec.deduped_destinations(), vec![b]);
    }
}
