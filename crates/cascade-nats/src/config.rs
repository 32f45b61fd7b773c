//! NATS connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the NATS client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[must_use = "config does nothing unless you use it"]
pub struct NatsConfig {
    /// NATS server URL.
    #[cfg_attr(feature = "config", arg(long, env = "NATS_URL"))]
    #[cfg_attr(feature = "config", arg(default_value = "nats://localhost:4222"))]
    pub nats_url: String,

    /// Connection name reported to the server.
    #[cfg_attr(feature = "config", arg(long, env = "NATS_CLIENT_NAME"))]
    #[cfg_attr(feature = "config", arg(default_value = "cascade-server"))]
    pub nats_client_name: String,

    /// Seconds to wait while establishing the connection.
    #[cfg_attr(feature = "config", arg(long, env = "NATS_CONNECT_TIMEOUT"))]
    #[cfg_attr(feature = "config", arg(default_value_t = 10))]
    pub nats_connect_timeout_secs: u64,
}

impl NatsConfig {
    /// Returns the connection timeout.
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.nats_connect_timeout_secs)
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_owned(),
            nats_client_name: "cascade-server".to_owned(),
            nats_connect_timeout_secs: 10,
        }
    }
}
