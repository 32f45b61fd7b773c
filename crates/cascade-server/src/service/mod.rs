//! Service layer: application state, configuration and the domain services
//! behind the HTTP handlers.

mod callback;
mod composition;
mod config;
mod dispatch;
mod runs;
mod scheduler;
mod state;

pub use callback::{CallbackClient, StateCallback};
pub use composition::WorkflowCompositionService;
pub use config::ServiceConfig;
pub use dispatch::PostCommit;
pub use runs::{PipelineRunDetail, PipelineRunService};
pub use scheduler::{WorkflowRunDetail, WorkflowRunService};
pub use state::ServiceState;
