/// Persistence layer for Tasklist
///
/// # Modules
///
/// - `store`: the `UserStore` / `TaskStore` traits and the `Stores` handle
/// - `postgres`: sqlx-backed implementation of both traits
/// - `memory`: in-process implementation of both traits
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded schema migrations
/// - Row types and their queries are in the `models` module at crate root level
///
/// # Example
///
/// ```no_run
/// use tasklist_shared::db::{pool::DatabaseConfig, store::Stores};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let stores = Stores::connect(&config).await?;
///     stores.health_check().await?;
///     Ok(())
/// }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;
