//! Admin authentication extractor.
//!
//! The back-office keeps the signed-in account in its own session cookie,
//! using the same [`CurrentUser`] record as the storefront. Only accounts
//! with `is_admin` set get through.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use marigold_storefront::models::{CurrentUser, session_keys};

use crate::error::AppError;

/// Extractor that requires a signed-in administrator.
///
/// Rejects with 401 when nobody is signed in and 403 when the account has
/// lost its admin flag since signing in.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_owned()))?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await?
            .ok_or_else(|| AppError::Unauthorized("sign in required".to_owned()))?;

        if !user.is_admin {
            return Err(AppError::Forbidden("administrator access required".to_owned()));
        }

        sentry::configure_scope(|scope| {
            scope.set_tag("admin_user_id", user.id);
        });
        Ok(Self(user))
    }
}
