//! Store settings.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::Value as JsonValue;
use tracing::instrument;

use marigold_core::Email;
use marigold_storefront::db::settings::keys;

use crate::db::SettingsRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{key}", get(show).put(update))
}

/// GET /api/settings
async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, JsonValue>>> {
    Ok(Json(SettingsRepository::new(state.pool()).all().await?))
}

/// GET /api/settings/{key}
async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<JsonValue>> {
    check_key(&key)?;
    SettingsRepository::new(state.pool())
        .get(&key)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("setting {key}")))
}

/// PUT /api/settings/{key}
#[instrument(skip(admin, state, value), fields(admin_id = %admin.id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<JsonValue>,
) -> Result<Json<JsonValue>> {
    check_key(&key)?;
    validate_value(&key, &value)?;
    SettingsRepository::new(state.pool()).set(&key, &value).await?;
    tracing::info!("Setting updated");
    Ok(Json(value))
}

fn check_key(key: &str) -> Result<()> {
    if keys::ALL.contains(&key) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("setting {key}")))
    }
}

/// Known settings hold strings; the email settings must parse.
fn validate_value(key: &str, value: &JsonValue) -> Result<()> {
    let text = value
        .as_str()
        .ok_or_else(|| AppError::BadRequest(format!("{key} must be a string")))?;
    if (key == keys::CONTACT_EMAIL || key == keys::ADMIN_NOTIFICATION_EMAIL)
        && Email::parse(text).is_err()
    {
        return Err(AppError::BadRequest(format!("{key} must be an email address")));
    }
    if text.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{key} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key(keys::STORE_NAME).is_ok());
        assert!(matches!(check_key("theme"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_validate_value() {
        assert!(validate_value(keys::STORE_NAME, &json!("Marigold")).is_ok());
        assert!(validate_value(keys::ADMIN_NOTIFICATION_EMAIL, &json!("ops@marigold.shop")).is_ok());
        assert!(validate_value(keys::ADMIN_NOTIFICATION_EMAIL, &json!("not an email")).is_err());
        assert!(validate_value(keys::CURRENCY, &json!(3)).is_err());
        assert!(validate_value(keys::CURRENCY, &json!("  ")).is_err());
    }
}
