//! Database models: one module per aggregate.

mod pipeline;
mod pipeline_run;
mod workflow;
mod workflow_run;

pub use pipeline::{NewPipeline, Pipeline, UpdatePipeline};
pub use pipeline_run::{
    NewPipelineRun, NewPipelineRunArtifact, NewPipelineRunInput, NewPipelineRunState, PipelineRun,
    PipelineRunArtifact, PipelineRunInput, PipelineRunState, UpdatePipelineRun,
};
pub use workflow::{
    NewWorkflow, NewWorkflowPipeline, NewWorkflowPipelineDependency, UpdateWorkflow, Workflow,
    WorkflowPipeline, WorkflowPipelineDependency,
};
pub use workflow_run::{
    NewWorkflowPipelineRun, NewWorkflowRun, NewWorkflowRunState, WorkflowPipelineRun, WorkflowRun,
    WorkflowRunState,
};
