/// Postgres persistence
///
/// # Modules
///
/// - `pool`: connection pool creation and health checks
/// - `migrations`: embedded schema migrations
/// - `pg_store`: [`crate::store::Store`] over the pool
///
/// Table SQL lives with each model in [`crate::models`].
///
/// # Example
///
/// ```no_run
/// use sellos_shared::db::{migrations::run_migrations, pg_store::PgStore};
/// use sellos_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }).await?;
///
/// run_migrations(&pool).await?;
/// let store = PgStore::new(pool);
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pg_store;
pub mod pool;
