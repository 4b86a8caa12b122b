//! Back-office account management.
//!
//! Administrators are ordinary accounts with `is_admin` set, so they can
//! also shop on the storefront with the same credentials.

use thiserror::Error;

use marigold_core::Email;
use marigold_storefront::db::{RepositoryError, UserRepository};
use marigold_storefront::services::auth::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Account creation rejected.
    #[error("Could not create account: {0}")]
    Auth(#[from] AuthError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No account exists with email: {0}")]
    UnknownUser(String),

    /// Database error.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create a new administrator account.
///
/// # Errors
///
/// Returns `AdminError` if the inputs fail validation, the email is taken,
/// or the database is unreachable.
pub async fn create_user(email: &str, password: &str, name: &str) -> Result<(), AdminError> {
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .create_user(email, password, name, true)
        .await?;

    tracing::info!(
        "Admin account created! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Set `is_admin` on an existing account.
///
/// # Errors
///
/// Returns `AdminError::UnknownUser` if no account has this email.
pub async fn grant(email: &str) -> Result<(), AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_admin(&parsed, true)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UnknownUser(email.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("{} ({}) can now sign in to the back-office", user.display_name, user.email);
    Ok(())
}
