//! Back-office sign-in.
//!
//! Uses the storefront's accounts; only users with `is_admin` may sign in.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marigold_storefront::error::{clear_sentry_user, set_sentry_user};
use marigold_storefront::middleware::{clear_current_user, set_current_user};
use marigold_storefront::models::CurrentUser;
use marigold_storefront::services::auth::AuthService;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Sign-in body.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// POST /api/auth/login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<CurrentUser>> {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Admin login failed");
            return Err(e.into());
        }
    };

    if !user.is_admin {
        tracing::warn!(user_id = %user.id, "Non-admin attempted back-office sign-in");
        return Err(AppError::Forbidden("administrator access required".to_owned()));
    }

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    tracing::info!(user_id = %current.id, "Admin signed in");
    Ok(Json(current))
}

/// POST /api/auth/logout
async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentUser> {
    Json(admin)
}
