//! App [`state`] configuration.
//!
//! [`state`]: crate::service::ServiceState

use std::time::Duration;

use cascade_nats::{ExecutorQueue, NatsClient, NatsConfig};
use cascade_opendal::{S3Config, StorageBackend};
use cascade_postgres::{PgClient, PgClientExt, PgConfig};
use serde::{Deserialize, Serialize};

use crate::handler::{Error, ErrorKind, Result};

const TRACING_TARGET: &str = "cascade_server::service::config";

/// Configuration for every external collaborator of the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Postgres connection and pool settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub postgres: PgConfig,

    /// Artifact object-store settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub storage: S3Config,

    /// Executor queue settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub nats: NatsConfig,

    /// Seconds allowed for an outgoing run callback before it is dropped.
    #[cfg_attr(feature = "config", arg(long, env = "CALLBACK_TIMEOUT"))]
    #[cfg_attr(feature = "config", arg(default_value_t = 10))]
    pub callback_timeout_secs: u64,

    /// Maximum artifact upload size in bytes.
    #[cfg_attr(feature = "config", arg(long, env = "MAX_CONTENT_LENGTH"))]
    #[cfg_attr(feature = "config", arg(default_value_t = 64 * 1024 * 1024))]
    pub max_content_length: usize,
}

impl ServiceConfig {
    /// Returns the outgoing callback timeout.
    #[inline]
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    /// Connects to Postgres, verifies connectivity and runs migrations.
    pub async fn connect_postgres(&self) -> Result<PgClient> {
        let client = PgClient::new_with_test(self.postgres.clone())
            .await
            .map_err(Error::from)?;

        client.run_pending_migrations().await.map_err(|error| {
            tracing::error!(target: TRACING_TARGET, error = %error, "Migration failure");
            ErrorKind::InternalServerError.with_context("database migrations failed")
        })?;

        Ok(client)
    }

    /// Creates the artifact storage backend.
    pub fn create_storage(&self) -> Result<StorageBackend> {
        StorageBackend::new(self.storage.clone()).map_err(Error::from)
    }

    /// Connects to NATS and provisions the executor queue.
    pub async fn connect_executor_queue(&self) -> Result<ExecutorQueue> {
        let nats_client = NatsClient::connect(&self.nats).await.map_err(|error| {
            tracing::error!(target: TRACING_TARGET, error = %error, "NATS connection failure");
            ErrorKind::InternalServerError.with_context("executor queue unavailable")
        })?;

        ExecutorQueue::new(nats_client.jetstream())
            .await
            .map_err(Error::from)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            postgres: PgConfig::default(),
            storage: S3Config::default(),
            nats: NatsConfig::default(),
            callback_timeout_secs: 10,
            max_content_length: 64 * 1024 * 1024,
        }
    }
}
