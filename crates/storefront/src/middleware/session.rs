//! Session middleware configuration and typed session access.
//!
//! Sessions are `PostgreSQL`-backed via tower-sessions. The visitor's cart,
//! checkout wizard and signed-in user all live in the session.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "marigold_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions` table is created by `mg-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    let is_secure = config.base_url.starts_with("https://");
    session_layer(store, SESSION_COOKIE_NAME, is_secure)
}

/// Build a session layer over any store with the shop's cookie settings.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    cookie_name: &'static str,
    is_secure: bool,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(cookie_name)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read a value from the session, falling back to its default.
///
/// # Errors
///
/// Returns an error if the session store fails or the value does not deserialize.
pub async fn load_or_default<T>(session: &Session, key: &str) -> Result<T, tower_sessions::session::Error>
where
    T: DeserializeOwned + Default,
{
    Ok(session.get::<T>(key).await?.unwrap_or_default())
}

/// Write a value into the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save<T: Serialize + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(key, value).await
}
