//! Run state enumeration shared by pipeline runs and workflow runs.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Execution state of a pipeline run or workflow run.
///
/// This enumeration corresponds to the `RUN_STATE` PostgreSQL enum. A run's
/// current state is the newest entry in its append-only state log. The numeric
/// codes are stable and appear on the wire unchanged across releases.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::RunState"]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Run exists but has not been handed to the executor
    #[db_rename = "queued"]
    #[serde(rename = "QUEUED")]
    #[default]
    Queued,

    /// Run was dispatched to the executor and awaits pickup
    #[db_rename = "not_started"]
    #[serde(rename = "NOT_STARTED")]
    NotStarted,

    /// Run is in progress on a worker
    #[db_rename = "running"]
    #[serde(rename = "RUNNING")]
    Running,

    /// Run finished successfully
    #[db_rename = "completed"]
    #[serde(rename = "COMPLETED")]
    Completed,

    /// Run failed with an error
    #[db_rename = "failed"]
    #[serde(rename = "FAILED")]
    Failed,

    /// Run was cancelled before completion
    #[db_rename = "cancelled"]
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl RunState {
    /// Returns the stable numeric code for this state.
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            RunState::Queued => 1,
            RunState::NotStarted => 2,
            RunState::Running => 3,
            RunState::Completed => 4,
            RunState::Failed => 5,
            RunState::Cancelled => 6,
        }
    }

    /// Resolves a stable numeric code back into a state.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(RunState::Queued),
            2 => Some(RunState::NotStarted),
            3 => Some(RunState::Running),
            4 => Some(RunState::Completed),
            5 => Some(RunState::Failed),
            6 => Some(RunState::Cancelled),
            _ => None,
        }
    }

    /// Returns whether the run is waiting in the queue.
    #[inline]
    pub fn is_queued(self) -> bool {
        matches!(self, RunState::Queued)
    }

    /// Returns whether the run completed successfully.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, RunState::Completed)
    }

    /// Returns whether the run failed.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, RunState::Failed)
    }

    /// Returns whether the run was cancelled.
    #[inline]
    pub fn is_cancelled(self) -> bool {
        matches!(self, RunState::Cancelled)
    }

    /// Returns whether the run has reached a terminal state.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RunState::Queued.code(), 1);
        assert_eq!(RunState::NotStarted.code(), 2);
        assert_eq!(RunState::Running.code(), 3);
        assert_eq!(RunState::Completed.code(), 4);
        assert_eq!(RunState::Failed.code(), 5);
        assert_eq!(RunState::Cancelled.code(), 6);
    }

    #[test]
    fn codes_round_trip() {
        for state in RunState::iter() {
            assert_eq!(RunState::from_code(state.code()), Some(state));
        }
        assert_eq!(RunState::from_code(0), None);
        assert_eq!(RunState::from_code(7), None);
    }

    #[test]
    fn wire_names_are_screaming_snake_case() {
        let encoded = serde_json::to_string(&RunState::NotStarted).unwrap();
        assert_eq!(encoded, "\"NOT_STARTED\"");

        let decoded: RunState = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(decoded, RunState::Cancelled);
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(RunState::Cancelled.is_terminal());
        assert!(!RunState::Queued.is_terminal());
        assert!(!RunState::NotStarted.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }
}
