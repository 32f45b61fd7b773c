#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod graph;
pub mod scheduler;
pub mod state;

pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::graph::DependencyGraph;
pub use crate::scheduler::{ArtifactCopy, ArtifactRef, NodeRun, Reaction, RunSnapshot};
pub use crate::state::{Transition, allowed_transitions, validate_transition};
