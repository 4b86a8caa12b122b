//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use sqlx::PgPool;

use marigold_storefront::config::{ConfigError, get_database_url};
use marigold_storefront::db::create_pool;

/// Errors shared by every command's setup.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load `.env` and connect to the shop database.
///
/// # Errors
///
/// Returns `ConnectError` if no database URL is set or the connection fails.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}
