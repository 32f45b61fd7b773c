//! The state-transition registry.
//!
//! Pipeline runs and workflow runs share a single transition table. A run's
//! state history is an append-only log; this module decides which entries may
//! legally follow which.

use cascade_postgres::types::RunState;

use crate::error::{WorkflowError, WorkflowResult};

/// Outcome of checking a requested state change against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The run is already in the requested state; append nothing.
    Noop,
    /// The change is legal; append the new state.
    Apply(RunState),
}

impl Transition {
    /// Returns the state to append, if any.
    #[inline]
    pub fn applied(self) -> Option<RunState> {
        match self {
            Transition::Noop => None,
            Transition::Apply(state) => Some(state),
        }
    }
}

/// Returns the states a run may legally move to from `from`.
///
/// Terminal states have no successors.
pub const fn allowed_transitions(from: RunState) -> &'static [RunState] {
    match from {
        RunState::Queued => &[RunState::NotStarted, RunState::Cancelled],
        RunState::NotStarted => &[RunState::Running, RunState::Failed, RunState::Cancelled],
        RunState::Running => &[RunState::Completed, RunState::Failed, RunState::Cancelled],
        RunState::Completed | RunState::Failed | RunState::Cancelled => &[],
    }
}

/// Checks a requested state change against the transition table.
///
/// A transition to the same state is a silent no-op; anything not in the
/// table is rejected with [`WorkflowError::InvalidTransition`].
pub fn validate_transition(from: RunState, to: RunState) -> WorkflowResult<Transition> {
    if from == to {
        return Ok(Transition::Noop);
    }

    if allowed_transitions(from).contains(&to) {
        Ok(Transition::Apply(to))
    } else {
        Err(WorkflowError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_may_start_or_cancel() {
        assert_eq!(
            validate_transition(RunState::Queued, RunState::NotStarted),
            Ok(Transition::Apply(RunState::NotStarted))
        );
        assert_eq!(
            validate_transition(RunState::Queued, RunState::Cancelled),
            Ok(Transition::Apply(RunState::Cancelled))
        );
        assert!(validate_transition(RunState::Queued, RunState::Running).is_err());
        assert!(validate_transition(RunState::Queued, RunState::Completed).is_err());
    }

    #[test]
    fn not_started_may_run_fail_or_cancel() {
        for to in [RunState::Running, RunState::Failed, RunState::Cancelled] {
            assert_eq!(
                validate_transition(RunState::NotStarted, to),
                Ok(Transition::Apply(to))
            );
        }
        assert!(validate_transition(RunState::NotStarted, RunState::Completed).is_err());
        assert!(validate_transition(RunState::NotStarted, RunState::Queued).is_err());
    }

    #[test]
    fn running_may_finish_fail_or_cancel() {
        for to in [RunState::Completed, RunState::Failed, RunState::Cancelled] {
            assert_eq!(
                validate_transition(RunState::Running, to),
                Ok(Transition::Apply(to))
            );
        }
        assert!(validate_transition(RunState::Running, RunState::Queued).is_err());
        assert!(validate_transition(RunState::Running, RunState::NotStarted).is_err());
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [RunState::Completed, RunState::Failed, RunState::Cancelled] {
            assert!(allowed_transitions(from).is_empty());
            for to in [
                RunState::Queued,
                RunState::NotStarted,
                RunState::Running,
                RunState::Completed,
                RunState::Failed,
                RunState::Cancelled,
            ] {
                if from == to {
                    continue;
                }
                assert_eq!(
                    validate_transition(from, to),
                    Err(WorkflowError::InvalidTransition { from, to })
                );
            }
        }
    }

    #[test]
    fn same_state_is_a_noop() {
        for state in [
            RunState::Queued,
            RunState::NotStarted,
            RunState::Running,
            RunState::Completed,
            RunState::Failed,
            RunState::Cancelled,
        ] {
            assert_eq!(validate_transition(state, state), Ok(Transition::Noop));
        }
    }
}
