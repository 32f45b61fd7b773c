#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod queue;

pub use client::NatsClient;
pub use config::NatsConfig;
pub use error::{Error, Result};
pub use queue::{ExecuteInput, ExecuteRequest, ExecutorQueue};

/// Tracing target for client and connection lifecycle.
pub const TRACING_TARGET_CLIENT: &str = "cascade_nats::client";

/// Tracing target for queue operations.
pub const TRACING_TARGET_QUEUE: &str = "cascade_nats::queue";
