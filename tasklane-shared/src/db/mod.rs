/// Storage layer for Tasklane
///
/// # Modules
///
/// - `store`: transactional `Store` / `Transaction` traits and `StoreError`
/// - `postgres`: `PgStore`, the production backend
/// - `memory`: `MemoryStore`, for development and tests
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded schema migrations
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasklane_shared::db::{pool::{create_pool, PoolConfig}, postgres::PgStore, store::Store};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(PoolConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     })
///     .await?;
///
///     let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
///     store.ping().await?;
///     Ok(())
/// }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;
