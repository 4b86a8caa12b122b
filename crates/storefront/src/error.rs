//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! the body is `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use marigold_core::catalog::CatalogError;
use marigold_core::checkout::CheckoutError;
use marigold_core::content::ContentError;
use marigold_core::coupon::CouponError;
use marigold_core::order::OrderError;
use marigold_core::payment::PaymentError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::PlaceOrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Product or variation cannot satisfy the request.
    #[error("{0}")]
    Catalog(#[from] CatalogError),

    /// Checkout wizard transition refused.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),

    /// Coupon rejected.
    #[error("{0}")]
    Coupon(#[from] CouponError),

    /// Order failed validation.
    #[error("{0}")]
    Order(#[from] OrderError),

    /// Payment declined or mismatched.
    #[error("{0}")]
    Payment(#[from] PaymentError),

    /// Comment or review failed validation.
    #[error("{0}")]
    Content(#[from] ContentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PlaceOrderError> for AppError {
    fn from(e: PlaceOrderError) -> Self {
        match e {
            PlaceOrderError::Coupon(e) => Self::Coupon(e),
            PlaceOrderError::Order(e) => Self::Order(e),
            PlaceOrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    /// The HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) | AuthError::InvalidName(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(CatalogError::OutOfStock { .. }) => StatusCode::CONFLICT,
            Self::Catalog(_) | Self::Order(_) | Self::Content(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::InvalidShipping(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CheckoutError::OutOfOrder { .. }
                | CheckoutError::AlreadySubmitting
                | CheckoutError::AlreadyComplete => StatusCode::CONFLICT,
                CheckoutError::Order(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            },
            Self::Coupon(CouponError::NotFound) => StatusCode::NOT_FOUND,
            Self::Coupon(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) | AuthError::InvalidName(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Checkout(CheckoutError::InvalidShipping(fields)) => {
                return (
                    status,
                    Json(serde_json::json!({
                        "error": self.to_string(),
                        "fields": fields,
                    })),
                )
                    .into_response();
            }
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
