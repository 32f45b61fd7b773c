//! Request DTOs for every handler.

mod pagination;
mod paths;
mod pipeline_runs;
mod pipelines;
mod workflow_pipelines;
mod workflow_runs;
mod workflows;

pub use pagination::PaginationParams;
pub use paths::{
    PipelinePathParams, PipelineRunPathParams, WorkflowPathParams, WorkflowPipelinePathParams,
    WorkflowRunPathParams,
};
pub use pipeline_runs::{CreatePipelineRun, RunInput, UpdateRunConsole, UpdateRunState};
pub use pipelines::{CreatePipeline, UpdatePipeline};
pub use workflow_pipelines::WorkflowPipelineSpec;
pub use workflow_runs::CreateWorkflowRun;
pub use workflows::{CreateWorkflow, UpdateWorkflow};
