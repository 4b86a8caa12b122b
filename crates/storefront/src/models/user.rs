//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marigold_core::{Email, UserId};

/// A shop account. Admins are users with `is_admin` set.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login address.
    pub email: Email,
    /// Shown on comments and reviews.
    pub display_name: String,
    /// May sign in to the admin back-office.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
