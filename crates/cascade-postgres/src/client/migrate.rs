//! Embedded migration runner.

use diesel::Connection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;

use crate::{MIGRATIONS, PgClient, PgConnection, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Extension trait running the embedded migrations through a [`PgClient`].
pub trait PgClientExt {
    /// Applies all pending migrations.
    ///
    /// Returns the number of migrations that were applied.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<usize>> + Send;
}

impl PgClientExt for PgClient {
    async fn run_pending_migrations(&self) -> PgResult<usize> {
        let database_url = self.config().postgres_url.clone();

        // diesel_migrations is synchronous; run it on a dedicated blocking
        // connection instead of holding a pooled one across the harness.
        let applied = tokio::task::spawn_blocking(move || {
            let mut conn: AsyncConnectionWrapper<PgConnection> =
                AsyncConnectionWrapper::establish(&database_url)
                    .map_err(PgError::Connection)?;

            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(PgError::Migration)
        })
        .await
        .map_err(|e| PgError::Unexpected(format!("migration task panicked: {e}").into()))??;

        if applied > 0 {
            tracing::info!(
                target: TRACING_TARGET_MIGRATION,
                applied = applied,
                "Applied pending database migrations"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_MIGRATION,
                "Database schema is up to date"
            );
        }

        Ok(applied)
    }
}
