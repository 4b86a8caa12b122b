//! Order confirmation delivery.
//!
//! Both the checkout request and the admin's `order_created` listener call
//! [`deliver_order_emails`]. Whoever wins the `confirmation_sent_at` claim
//! sends; the other path sees [`Delivery::AlreadySent`].

use sqlx::PgPool;
use thiserror::Error;

use marigold_core::Email;
use marigold_core::order::Order;

use crate::db::settings::keys;
use crate::db::{OrderRepository, RepositoryError, SettingsRepository};
use crate::services::email::{EmailError, EmailService};

/// Errors while delivering order emails.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// What happened for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// This caller won the claim and sent the emails.
    Sent,
    /// Another path already claimed the order.
    AlreadySent,
}

/// Claim the order and send confirmation and admin notification.
///
/// A failed confirmation releases the claim so the other path can retry. A
/// failed admin notification is logged and does not undo the claim.
///
/// # Errors
///
/// Returns `NotifyError` if the claim or the customer confirmation fails.
#[tracing::instrument(skip(pool, email, order), fields(order_id = %order.id))]
pub async fn deliver_order_emails(
    pool: &PgPool,
    email: &EmailService,
    order: &Order,
) -> Result<Delivery, NotifyError> {
    let orders = OrderRepository::new(pool);
    if !orders.claim_confirmation(order.id).await? {
        tracing::debug!("Confirmation already claimed");
        return Ok(Delivery::AlreadySent);
    }

    if let Some(to) = order.contact_email() {
        if let Err(e) = email.send_order_confirmation(&to, order).await {
            if let Err(release_err) = orders.release_confirmation(order.id).await {
                tracing::error!(error = %release_err, "Failed to release confirmation claim");
            }
            return Err(e.into());
        }
    } else {
        tracing::warn!("Order has no deliverable contact email");
    }

    match admin_recipient(pool, email).await {
        Ok(Some(admin)) => {
            if let Err(e) = email.send_admin_notification(&admin, order).await {
                tracing::warn!(error = %e, "Admin notification failed");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Could not read admin notification setting"),
    }

    Ok(Delivery::Sent)
}

/// The stored setting wins over the configured address.
async fn admin_recipient(
    pool: &PgPool,
    email: &EmailService,
) -> Result<Option<Email>, RepositoryError> {
    let stored = SettingsRepository::new(pool)
        .get_string(keys::ADMIN_NOTIFICATION_EMAIL)
        .await?
        .and_then(|s| Email::parse(&s).ok());
    Ok(stored.or_else(|| email.admin_notification().cloned()))
}
