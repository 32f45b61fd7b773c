//! Connection pool client, configuration and migrations.

mod migrate;
mod pg_client;
mod pg_config;

pub use migrate::PgClientExt;
pub use pg_client::{PgClient, PgConn, PgPoolStatus};
pub use pg_config::PgConfig;
