//! Store-wide settings stored as JSON values.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use sqlx::types::Json;

use super::RepositoryError;

/// Well-known setting keys.
pub mod keys {
    pub const STORE_NAME: &str = "store_name";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const CURRENCY: &str = "currency";
    /// Overrides `ADMIN_NOTIFICATION_EMAIL` when set.
    pub const ADMIN_NOTIFICATION_EMAIL: &str = "admin_notification_email";

    pub const ALL: [&str; 4] = [STORE_NAME, CONTACT_EMAIL, CURRENCY, ADMIN_NOTIFICATION_EMAIL];
}

/// Repository for `shop.settings`.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get one setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        let value: Option<Json<JsonValue>> =
            sqlx::query_scalar("SELECT value FROM shop.settings WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;
        Ok(value.map(|v| v.0))
    }

    /// Get a setting that holds a string.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.as_str().map(str::to_owned))
            .filter(|s| !s.trim().is_empty()))
    }

    /// Every setting, keyed by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<BTreeMap<String, JsonValue>, RepositoryError> {
        let rows: Vec<(String, Json<JsonValue>)> =
            sqlx::query_as("SELECT key, value FROM shop.settings ORDER BY key")
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(|(k, v)| (k, v.0)).collect())
    }

    /// Insert or replace a setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(Json(value))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
