//! NATS client wrapper and connection management.

use async_nats::{Client, ConnectOptions, jetstream};

use crate::config::NatsConfig;
use crate::error::{Error, Result};
use crate::TRACING_TARGET_CLIENT;

/// NATS client wrapper with a JetStream context.
#[derive(Debug, Clone)]
pub struct NatsClient {
    client: Client,
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Creates a new NATS client and connects to the cluster.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CLIENT)]
    pub async fn connect(config: &NatsConfig) -> Result<Self> {
        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            url = %config.nats_url,
            "Connecting to NATS"
        );

        let connect_opts = ConnectOptions::new()
            .name(&config.nats_client_name)
            .connection_timeout(config.connect_timeout());

        let client = connect_opts
            .connect(&config.nats_url)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let jetstream = jetstream::new(client.clone());

        Ok(Self { client, jetstream })
    }

    /// Returns the underlying core NATS client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the JetStream context.
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }
}
