//! The workflow-run scheduler.
//!
//! Pure planning: given the in-memory aggregate of a workflow run and the
//! pipeline run whose state just changed, compute the effects to apply. The
//! service layer owns transactions, presigned URLs and executor dispatch;
//! nothing here performs I/O.

mod reaction;
mod snapshot;

use cascade_postgres::types::RunState;
use uuid::Uuid;

pub use self::reaction::{ArtifactCopy, Reaction};
pub use self::snapshot::{ArtifactRef, NodeRun, RunSnapshot};
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::DependencyGraph;
use crate::state::{Transition, validate_transition};

/// Tracing target for scheduler planning.
const TRACING_TARGET: &str = "cascade_runtime::scheduler";

/// Selects the nodes to start when a workflow run is created.
///
/// Roots are the nodes with no incoming edges. A workflow without any
/// (including an empty workflow) cannot run.
pub fn plan_roots(graph: &DependencyGraph) -> WorkflowResult<Vec<Uuid>> {
    if graph.is_empty() {
        return Err(WorkflowError::NoRunnableRoots);
    }

    let roots = graph.roots();
    if roots.is_empty() {
        // Unreachable once the graph passed DAG validation, kept as a guard
        // against edges that slipped in between validation and run creation.
        return Err(WorkflowError::NoRunnableRoots);
    }

    Ok(roots)
}

/// Computes the scheduler reaction to a pipeline-run state change.
///
/// `pipeline_run_id` must belong to the snapshot; its node's `state` is the
/// freshly re-read current state, so stale callbacks never plan against an
/// outdated aggregate.
pub fn plan_reaction(snapshot: &RunSnapshot, pipeline_run_id: Uuid) -> WorkflowResult<Reaction> {
    let node = snapshot.node_for_pipeline_run(pipeline_run_id)?;
    let graph = snapshot.graph()?;
    let mut reaction = Reaction::default();

    match node.state {
        // QUEUED only ever appears as a run's initial entry, never as a
        // transition the scheduler gets to observe.
        RunState::Queued => {
            return Err(WorkflowError::UnexpectedState {
                pipeline_run_id,
                state: RunState::Queued,
            });
        }

        RunState::NotStarted | RunState::Running => {
            if snapshot.state == RunState::NotStarted {
                reaction.workflow_transition = Some(RunState::Running);
            }
        }

        RunState::Failed => {
            for sibling in &snapshot.nodes {
                if sibling.pipeline_run_id != pipeline_run_id && !sibling.state.is_terminal() {
                    reaction
                        .run_transitions
                        .push((sibling.pipeline_run_id, RunState::Cancelled));
                }
            }
            reaction.workflow_transition =
                workflow_transition_to(snapshot, RunState::Cancelled);
        }

        RunState::Cancelled => {
            for descendant_id in graph.descendants(node.workflow_pipeline_id) {
                let Some(descendant) = snapshot.node(descendant_id) else {
                    continue;
                };
                if descendant.state == RunState::Queued {
                    reaction
                        .run_transitions
                        .push((descendant.pipeline_run_id, RunState::Cancelled));
                }
            }

            if all_terminal_after(snapshot, &reaction) {
                let aggregate = aggregate_state(snapshot, &reaction);
                reaction.workflow_transition = workflow_transition_to(snapshot, aggregate);
            }
        }

        RunState::Completed => {
            for successor_id in graph.successors(node.workflow_pipeline_id) {
                let Some(successor) = snapshot.node(successor_id) else {
                    continue;
                };
                if successor.state != RunState::Queued {
                    continue;
                }

                for artifact in &node.artifacts {
                    if successor.copied_artifact_ids.contains(&artifact.id) {
                        continue;
                    }
                    reaction.artifact_copies.push(ArtifactCopy {
                        artifact_id: artifact.id,
                        name: artifact.name.clone(),
                        source_pipeline_id: node.pipeline_id,
                        source_pipeline_run_id: node.pipeline_run_id,
                        target_pipeline_run_id: successor.pipeline_run_id,
                    });
                }

                let ready = graph
                    .predecessors(successor_id)
                    .into_iter()
                    .all(|predecessor_id| {
                        snapshot
                            .node(predecessor_id)
                            .is_some_and(|predecessor| predecessor.state == RunState::Completed)
                    });
                if ready {
                    reaction.starts.push(successor.pipeline_run_id);
                }
            }

            if snapshot
                .nodes
                .iter()
                .all(|node| node.state == RunState::Completed)
            {
                reaction.workflow_transition =
                    workflow_transition_to(snapshot, RunState::Completed);
            } else if snapshot.all_terminal() {
                let aggregate = aggregate_state(snapshot, &reaction);
                reaction.workflow_transition = workflow_transition_to(snapshot, aggregate);
            }
        }
    }

    Ok(reaction)
}

/// Resolves the workflow-run transition towards `target`, if it is legal.
///
/// Replayed reactions land here with the workflow run already in `target`
/// (a no-op) or already terminal (dropped with a warning); both leave the
/// run untouched, which keeps reactions safe to re-run.
fn workflow_transition_to(snapshot: &RunSnapshot, target: RunState) -> Option<RunState> {
    match validate_transition(snapshot.state, target) {
        Ok(Transition::Apply(state)) => Some(state),
        Ok(Transition::Noop) => None,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                workflow_run_id = %snapshot.workflow_run_id,
                error = %error,
                "Dropping illegal workflow-run transition"
            );
            None
        }
    }
}

/// Returns whether every run is terminal once the planned transitions land.
fn all_terminal_after(snapshot: &RunSnapshot, reaction: &Reaction) -> bool {
    snapshot.nodes.iter().all(|node| {
        node.state.is_terminal()
            || reaction
                .run_transitions
                .iter()
                .any(|&(run_id, state)| run_id == node.pipeline_run_id && state.is_terminal())
    })
}

/// The aggregate terminal rule over the post-reaction run states.
///
/// All completed means completed; any failure (or any cancellation) means
/// the workflow run ends cancelled.
fn aggregate_state(snapshot: &RunSnapshot, reaction: &Reaction) -> RunState {
    let all_completed = snapshot.nodes.iter().all(|node| {
        let planned = reaction
            .run_transitions
            .iter()
            .find(|&&(run_id, _)| run_id == node.pipeline_run_id)
            .map(|&(_, state)| state);
        planned.unwrap_or(node.state) == RunState::Completed
    });

    if all_completed {
        RunState::Completed
    } else {
        RunState::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct SnapshotBuilder {
        snapshot: RunSnapshot,
    }

    impl SnapshotBuilder {
        fn new(state: RunState) -> Self {
            Self {
                snapshot: RunSnapshot {
                    workflow_run_id: Uuid::new_v4(),
                    state,
                    nodes: Vec::new(),
                    edges: Vec::new(),
                },
            }
        }

        fn node(&mut self, state: RunState) -> Uuid {
            let workflow_pipeline_id = Uuid::new_v4();
            self.snapshot.nodes.push(NodeRun {
                workflow_pipeline_id,
                pipeline_run_id: Uuid::new_v4(),
                pipeline_id: Uuid::new_v4(),
                state,
                artifacts: Vec::new(),
                copied_artifact_ids: HashSet::new(),
            });
            workflow_pipeline_id
        }

        fn edge(&mut self, from: Uuid, to: Uuid) {
            self.snapshot.edges.push((from, to));
        }

        fn artifact(&mut self, node_id: Uuid, name: &str) -> Uuid {
            let artifact_id = Uuid::new_v4();
            let node = self.node_mut(node_id);
            node.artifacts.push(ArtifactRef {
                id: artifact_id,
                name: name.to_owned(),
            });
            artifact_id
        }

        fn set_state(&mut self, node_id: Uuid, state: RunState) {
            self.node_mut(node_id).state = state;
        }

        fn mark_copied(&mut self, node_id: Uuid, artifact_id: Uuid) {
            self.node_mut(node_id).copied_artifact_ids.insert(artifact_id);
        }

        fn run_id(&self, node_id: Uuid) -> Uuid {
            self.snapshot.node(node_id).unwrap().pipeline_run_id
        }

        fn node_mut(&mut self, node_id: Uuid) -> &mut NodeRun {
            self.snapshot
                .nodes
                .iter_mut()
                .find(|node| node.workflow_pipeline_id == node_id)
                .unwrap()
        }
    }

    #[test]
    fn empty_workflow_has_no_runnable_roots() {
        let graph = DependencyGraph::new(&[], &[]).unwrap();
        assert_eq!(plan_roots(&graph), Err(WorkflowError::NoRunnableRoots));
    }

    #[test]
    fn roots_of_a_line_is_its_head() {
        let nodes: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let graph = DependencyGraph::new(
            &nodes,
            &[(nodes[0], nodes[1]), (nodes[1], nodes[2])],
        )
        .unwrap();
        assert_eq!(plan_roots(&graph), Ok(vec![nodes[0]]));
    }

    #[test]
    fn unknown_pipeline_run_is_rejected() {
        let builder = SnapshotBuilder::new(RunState::Running);
        let stranger = Uuid::new_v4();
        assert_eq!(
            plan_reaction(&builder.snapshot, stranger),
            Err(WorkflowError::UnknownPipelineRun(stranger))
        );
    }

    #[test]
    fn queued_observation_is_an_error() {
        let mut builder = SnapshotBuilder::new(RunState::NotStarted);
        let a = builder.node(RunState::Queued);
        let run_a = builder.run_id(a);

        assert_eq!(
            plan_reaction(&builder.snapshot, run_a),
            Err(WorkflowError::UnexpectedState {
                pipeline_run_id: run_a,
                state: RunState::Queued,
            })
        );
    }

    #[test]
    fn first_running_node_moves_workflow_run_to_running() {
        let mut builder = SnapshotBuilder::new(RunState::NotStarted);
        let a = builder.node(RunState::Running);
        let b = builder.node(RunState::Queued);
        builder.edge(a, b);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert_eq!(reaction.workflow_transition, Some(RunState::Running));
        assert!(reaction.run_transitions.is_empty());
        assert!(reaction.starts.is_empty());
    }

    #[test]
    fn running_node_leaves_running_workflow_run_alone() {
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Running);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert!(reaction.is_empty());
    }

    #[test]
    fn linear_chain_advances_one_edge_at_a_time() {
        // A -> B -> C, A completed with one artifact.
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let b = builder.node(RunState::Queued);
        let c = builder.node(RunState::Queued);
        builder.edge(a, b);
        builder.edge(b, c);
        let artifact = builder.artifact(a, "a1.txt");

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();

        assert_eq!(reaction.artifact_copies.len(), 1);
        let copy = &reaction.artifact_copies[0];
        assert_eq!(copy.artifact_id, artifact);
        assert_eq!(copy.name, "a1.txt");
        assert_eq!(copy.target_pipeline_run_id, builder.run_id(b));

        assert_eq!(reaction.starts, vec![builder.run_id(b)]);
        assert_eq!(reaction.workflow_transition, None);
    }

    #[test]
    fn last_completion_completes_the_workflow_run() {
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let b = builder.node(RunState::Completed);
        builder.edge(a, b);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(b)).unwrap();
        assert_eq!(reaction.workflow_transition, Some(RunState::Completed));
        assert!(reaction.starts.is_empty());
        assert!(reaction.artifact_copies.is_empty());
    }

    #[test]
    fn isolated_root_completes_workflow_alone() {
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert_eq!(reaction.workflow_transition, Some(RunState::Completed));
    }

    #[test]
    fn diamond_sink_waits_for_both_branches() {
        // A -> {B, C} -> D
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let b = builder.node(RunState::Queued);
        let c = builder.node(RunState::Queued);
        let d = builder.node(RunState::Queued);
        builder.edge(a, b);
        builder.edge(a, c);
        builder.edge(b, d);
        builder.edge(c, d);
        builder.artifact(a, "a.txt");

        // A completes: both branches receive the artifact and start.
        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert_eq!(reaction.artifact_copies.len(), 2);
        assert_eq!(
            reaction.starts,
            vec![builder.run_id(b), builder.run_id(c)]
        );

        // B completes first: D receives b.txt but must not start yet.
        builder.set_state(b, RunState::Completed);
        builder.set_state(c, RunState::Running);
        let b_artifact = builder.artifact(b, "b.txt");
        let reaction = plan_reaction(&builder.snapshot, builder.run_id(b)).unwrap();
        assert_eq!(reaction.artifact_copies.len(), 1);
        assert_eq!(reaction.artifact_copies[0].artifact_id, b_artifact);
        assert_eq!(
            reaction.artifact_copies[0].target_pipeline_run_id,
            builder.run_id(d)
        );
        assert!(reaction.starts.is_empty());
        assert_eq!(reaction.workflow_transition, None);

        // C completes: D receives c.txt and starts.
        builder.set_state(c, RunState::Completed);
        builder.mark_copied(d, b_artifact);
        let c_artifact = builder.artifact(c, "c.txt");
        let reaction = plan_reaction(&builder.snapshot, builder.run_id(c)).unwrap();
        assert_eq!(reaction.artifact_copies.len(), 1);
        assert_eq!(reaction.artifact_copies[0].artifact_id, c_artifact);
        assert_eq!(reaction.starts, vec![builder.run_id(d)]);

        // D completes: the workflow run completes.
        builder.set_state(d, RunState::Completed);
        let reaction = plan_reaction(&builder.snapshot, builder.run_id(d)).unwrap();
        assert_eq!(reaction.workflow_transition, Some(RunState::Completed));
    }

    #[test]
    fn failure_cancels_every_non_terminal_sibling() {
        // A -> B -> C; A failed while B and C are waiting.
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Failed);
        let b = builder.node(RunState::Queued);
        let c = builder.node(RunState::Queued);
        builder.edge(a, b);
        builder.edge(b, c);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();

        let mut cancelled: Vec<Uuid> = reaction
            .run_transitions
            .iter()
            .map(|&(run_id, state)| {
                assert_eq!(state, RunState::Cancelled);
                run_id
            })
            .collect();
        cancelled.sort();
        let mut expected = vec![builder.run_id(b), builder.run_id(c)];
        expected.sort();
        assert_eq!(cancelled, expected);

        assert_eq!(reaction.workflow_transition, Some(RunState::Cancelled));
        assert!(reaction.starts.is_empty());
        assert!(reaction.artifact_copies.is_empty());
    }

    #[test]
    fn failure_cancels_dispatched_siblings_regardless_of_position() {
        // Two roots; the sibling root is already NOT_STARTED on a worker.
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Failed);
        let b = builder.node(RunState::NotStarted);
        let sink = builder.node(RunState::Queued);
        builder.edge(a, sink);
        builder.edge(b, sink);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        let cancelled: HashSet<Uuid> = reaction
            .run_transitions
            .iter()
            .map(|&(run_id, _)| run_id)
            .collect();
        assert!(cancelled.contains(&builder.run_id(b)));
        assert!(cancelled.contains(&builder.run_id(sink)));
        assert_eq!(reaction.workflow_transition, Some(RunState::Cancelled));
    }

    #[test]
    fn failure_before_workflow_ran_cancels_from_not_started() {
        let mut builder = SnapshotBuilder::new(RunState::NotStarted);
        let a = builder.node(RunState::Failed);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert_eq!(reaction.workflow_transition, Some(RunState::Cancelled));
    }

    #[test]
    fn cancellation_propagates_to_queued_descendants_only() {
        // A -> B -> C with a side root R; B cancelled.
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let b = builder.node(RunState::Cancelled);
        let c = builder.node(RunState::Queued);
        let _side_root = builder.node(RunState::Running);
        builder.edge(a, b);
        builder.edge(b, c);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(b)).unwrap();
        assert_eq!(
            reaction.run_transitions,
            vec![(builder.run_id(c), RunState::Cancelled)]
        );
        // The side root is still running: no aggregate terminal yet.
        assert_eq!(reaction.workflow_transition, None);
    }

    #[test]
    fn final_cancellation_aggregates_the_workflow_run() {
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let b = builder.node(RunState::Cancelled);
        let c = builder.node(RunState::Queued);
        builder.edge(a, b);
        builder.edge(b, c);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(b)).unwrap();
        assert_eq!(
            reaction.run_transitions,
            vec![(builder.run_id(c), RunState::Cancelled)]
        );
        assert_eq!(reaction.workflow_transition, Some(RunState::Cancelled));
    }

    #[test]
    fn completed_reaction_skips_started_successors() {
        // Replay: B already NOT_STARTED, artifact already copied.
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let b = builder.node(RunState::NotStarted);
        builder.edge(a, b);
        builder.artifact(a, "a.txt");

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert!(reaction.is_empty());
    }

    #[test]
    fn copied_artifacts_are_not_copied_twice() {
        // A completed into a still-waiting B (second predecessor pending).
        let mut builder = SnapshotBuilder::new(RunState::Running);
        let a = builder.node(RunState::Completed);
        let other = builder.node(RunState::Running);
        let b = builder.node(RunState::Queued);
        builder.edge(a, b);
        builder.edge(other, b);
        let artifact = builder.artifact(a, "a.txt");
        builder.mark_copied(b, artifact);

        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert!(reaction.artifact_copies.is_empty());
        assert!(reaction.starts.is_empty());
    }

    #[test]
    fn terminal_workflow_run_is_never_reopened() {
        let mut builder = SnapshotBuilder::new(RunState::Cancelled);
        let a = builder.node(RunState::Failed);
        let b = builder.node(RunState::Cancelled);
        builder.edge(a, b);

        // Replayed failure reaction: everything already terminal.
        let reaction = plan_reaction(&builder.snapshot, builder.run_id(a)).unwrap();
        assert_eq!(reaction.workflow_transition, None);
        assert!(reaction.run_transitions.is_empty());
    }
}
