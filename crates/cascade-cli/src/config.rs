//! Command-line configuration.

use cascade_server::service::ServiceConfig;
use clap::Parser;

/// The cascade workflow service.
#[derive(Debug, Clone, Parser)]
#[command(name = "cascade", version, about)]
pub struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP server binds to.
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// External service configuration.
    #[command(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Returns the socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
