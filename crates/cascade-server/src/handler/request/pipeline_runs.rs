//! Pipeline run request types.

use cascade_postgres::types::RunState;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One input handed to a run at creation time.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    /// Filename the worker stores the download under.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// URL the worker fetches the input from.
    #[validate(url)]
    pub url: String,
}

/// Request payload for creating a pipeline run.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipelineRun {
    /// Inputs the worker downloads before starting.
    #[validate(nested)]
    #[serde(default)]
    pub inputs: Vec<RunInput>,
    /// URL notified on every state change of this run.
    #[validate(url)]
    pub callback_url: Option<String>,
    /// When true, the run stays queued instead of starting immediately.
    #[serde(default)]
    pub queued: bool,
}

/// Executor callback payload reporting a run state change.
#[must_use]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunState {
    /// The state the run moved to.
    pub state: RunState,
    /// Address of the worker reporting the change.
    pub worker_ip: Option<std::net::IpAddr>,
}

/// Executor callback payload carrying captured console streams.
#[must_use]
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunConsole {
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_inputs_require_well_formed_urls() {
        let request = CreatePipelineRun {
            inputs: vec![RunInput {
                name: "data.csv".to_owned(),
                url: "not a url".to_owned(),
            }],
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = CreatePipelineRun {
            inputs: vec![RunInput {
                name: "data.csv".to_owned(),
                url: "https://example.com/data.csv".to_owned(),
            }],
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn state_names_deserialize_from_the_wire() {
        let request: UpdateRunState = serde_json::from_str(r#"{"state":"RUNNING"}"#).unwrap();
        assert_eq!(request.state, RunState::Running);
        assert_eq!(request.worker_ip, None);

        let request: UpdateRunState =
            serde_json::from_str(r#"{"state":"RUNNING","workerIp":"10.0.0.7"}"#).unwrap();
        assert_eq!(
            request.worker_ip,
            Some(std::net::IpAddr::from([10, 0, 0, 7]))
        );
    }
}
