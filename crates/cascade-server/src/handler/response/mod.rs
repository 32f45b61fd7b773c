//! Response DTOs for every handler.

mod error_response;
mod pipeline_runs;
mod pipelines;
mod workflow_pipelines;
mod workflow_runs;
mod workflows;

pub use error_response::ErrorResponse;
pub use pipeline_runs::{Artifact, PipelineRun, PipelineRunSummary, RunInput, RunStateEntry};
pub use pipelines::Pipeline;
pub use workflow_pipelines::WorkflowPipeline;
pub use workflow_runs::{WorkflowPipelineRun, WorkflowRun, WorkflowRunSummary};
pub use workflows::Workflow;
