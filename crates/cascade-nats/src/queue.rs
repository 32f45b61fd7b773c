//! Executor work queue.

use async_nats::jetstream::{self, stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::TRACING_TARGET_QUEUE;

/// JetStream stream backing the executor queue.
const STREAM_NAME: &str = "EXECUTOR";

/// Subject pattern owned by the stream.
const STREAM_SUBJECTS: &str = "executor.pipelines.>";

/// Subject pipeline-run execution requests are published to.
const RUN_SUBJECT: &str = "executor.pipelines.run";

/// An input the executor downloads before running the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteInput {
    /// Filename the worker stores the download under.
    pub name: String,
    /// URL the worker fetches the input from.
    pub url: String,
}

/// A pipeline-run execution request handed to the executor fleet.
///
/// The executor reports progress back through the server's run callbacks;
/// delivery here is at-least-once, so the callbacks must tolerate replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Pipeline being executed.
    pub pipeline_id: Uuid,
    /// Run to report progress against.
    pub pipeline_run_id: Uuid,
    /// Inputs to download before starting.
    pub inputs: Vec<ExecuteInput>,
    /// Docker image to run, when the pipeline uses a prebuilt image.
    pub docker_image_url: Option<String>,
    /// Repository to build and run, when no image is given.
    pub repository_ssh_url: Option<String>,
    /// Branch to check out when building from a repository.
    pub repository_branch: Option<String>,
}

/// Publisher for executor work.
#[derive(Debug, Clone)]
pub struct ExecutorQueue {
    jetstream: jetstream::Context,
}

impl ExecutorQueue {
    /// Creates the executor queue, provisioning the stream if needed.
    #[tracing::instrument(skip(jetstream), target = TRACING_TARGET_QUEUE)]
    pub async fn new(jetstream: &jetstream::Context) -> Result<Self> {
        let stream_config = stream::Config {
            name: STREAM_NAME.to_owned(),
            description: Some("Pipeline execution work queue".to_owned()),
            subjects: vec![STREAM_SUBJECTS.to_owned()],
            retention: stream::RetentionPolicy::WorkQueue,
            ..Default::default()
        };

        match jetstream.get_stream(STREAM_NAME).await {
            Ok(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_QUEUE,
                    stream = STREAM_NAME,
                    "Using existing executor stream"
                );
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_QUEUE,
                    stream = STREAM_NAME,
                    "Creating executor stream"
                );
                jetstream
                    .create_stream(stream_config)
                    .await
                    .map_err(|e| Error::operation("stream_create", e.to_string()))?;
            }
        }

        Ok(Self {
            jetstream: jetstream.clone(),
        })
    }

    /// Submits an execution request to the queue.
    ///
    /// Waits for the broker acknowledgement so a request is never silently
    /// dropped between commit and pickup.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_QUEUE,
        fields(
            pipeline_id = %request.pipeline_id,
            pipeline_run_id = %request.pipeline_run_id,
        )
    )]
    pub async fn submit(&self, request: &ExecuteRequest) -> Result<()> {
        let payload = serde_json::to_vec(request)?;

        self.jetstream
            .publish(RUN_SUBJECT, payload.into())
            .await
            .map_err(|e| Error::operation("publish", e.to_string()))?
            .await
            .map_err(|e| Error::operation("publish_ack", e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_QUEUE,
            inputs = request.inputs.len(),
            "Submitted execution request"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_round_trips_as_json() {
        let request = ExecuteRequest {
            pipeline_id: Uuid::new_v4(),
            pipeline_run_id: Uuid::new_v4(),
            inputs: vec![ExecuteInput {
                name: "data.csv".to_owned(),
                url: "https://example.com/data.csv".to_owned(),
            }],
            docker_image_url: Some("registry.example.com/job:latest".to_owned()),
            repository_ssh_url: None,
            repository_branch: None,
        };

        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: ExecuteRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn run_subject_belongs_to_the_stream() {
        assert!(RUN_SUBJECT.starts_with("executor.pipelines."));
    }
}
