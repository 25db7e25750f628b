//! Embedded schema migrations.

use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// ## Summary
/// Applies all pending migrations to the database at `database_url`.
///
/// Migrations run on a blocking connection in a worker thread.
///
/// ## Errors
/// Returns an error if connecting or running a migration fails.
#[tracing::instrument(skip(database_url))]
pub async fn run_pending(database_url: &str) -> anyhow::Result<usize> {
    let url = database_url.to_string();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&url)?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
        Ok::<_, anyhow::Error>(versions.len())
    })
    .await??;

    tracing::info!(applied, "Database migrations complete");
    Ok(applied)
}
