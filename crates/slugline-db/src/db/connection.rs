use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use slugline_core::config::DatabaseConfig;

use crate::db::DbProvider;
use crate::error::DbResult;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'pool> = PooledConnection<'pool, AsyncPgConnection>;

/// ## Summary
/// Opens the pool behind [`crate::PgDocumentStore`], sized by
/// `database.max_connections`.
///
/// Each document write, conflict scan and slug release holds one connection
/// for the length of its transaction, so the pool size bounds how many slug
/// resolutions run at once. Connections are opened on first use.
///
/// ## Errors
/// Returns an error if the pool cannot be built for `database.url`.
#[tracing::instrument(skip(database), fields(max_connections = database.max_connections))]
pub async fn create_pool(database: &DatabaseConfig) -> anyhow::Result<DbPool> {
    let size = u32::from(database.max_connections.max(1));
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database.url.as_str());

    let pool = Pool::builder()
        .max_size(size)
        .min_idle(None)
        .test_on_check_out(false)
        .build(manager)
        .await?;

    tracing::info!(max_connections = size, "Document store pool ready");
    Ok(pool)
}

impl DbProvider for DbPool {
    fn get_connection<'a>(
        &'a self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DbResult<DbConnection<'a>>> + Send + 'a>>
    {
        Box::pin(async move {
            let conn = self.get().await.inspect_err(|err| {
                tracing::warn!(
                    error = %err,
                    open = self.state().connections,
                    "No pooled connection for document store"
                );
            })?;
            Ok(conn)
        })
    }
}
