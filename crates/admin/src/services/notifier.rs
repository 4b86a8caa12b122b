//! Order notification listener.
//!
//! A trigger on `shop.orders` sends `NOTIFY order_created, '<id>'` for every
//! insert. This task `LISTEN`s on that channel and delivers the confirmation
//! and admin notification through the same claim the storefront uses, so
//! each order is emailed once whichever path gets there first.

use std::future::Future;

use sqlx::PgPool;
use sqlx::postgres::PgListener;

use marigold_core::OrderId;
use marigold_storefront::db::OrderRepository;
use marigold_storefront::services::email::EmailService;
use marigold_storefront::services::notifications::{Delivery, deliver_order_emails};

/// Channel the order trigger notifies on.
pub const ORDER_CREATED_CHANNEL: &str = "order_created";

/// Listens for new orders and sends their emails.
pub struct OrderNotifier {
    pool: PgPool,
    email: EmailService,
}

impl OrderNotifier {
    #[must_use]
    pub const fn new(pool: PgPool, email: EmailService) -> Self {
        Self { pool, email }
    }

    /// Listen until `shutdown` resolves.
    ///
    /// Lost connections are re-established by the listener on the next
    /// receive; notifications sent while disconnected are missed, and those
    /// orders are covered by the storefront's own send.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the initial `LISTEN` cannot be set up.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(ORDER_CREATED_CHANNEL).await?;
        tracing::info!(channel = ORDER_CREATED_CHANNEL, "Order notifier listening");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Order notifier stopping");
                    return Ok(());
                }
                received = listener.recv() => match received {
                    Ok(notification) => self.handle(notification.payload()).await,
                    Err(e) => {
                        tracing::warn!(error = %e, "Order notifier receive failed");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                },
            }
        }
    }

    /// Deliver emails for one notification payload.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, payload: &str) {
        let Some(order_id) = parse_order_id(payload) else {
            tracing::warn!("Ignoring malformed order notification");
            return;
        };

        let order = match OrderRepository::new(&self.pool).get(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::warn!(order_id = %order_id, "Notified order does not exist");
                return;
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Failed to load notified order");
                return;
            }
        };

        match deliver_order_emails(&self.pool, &self.email, &order).await {
            Ok(Delivery::Sent) => tracing::info!(order_id = %order_id, "Order emails sent"),
            Ok(Delivery::AlreadySent) => {
                tracing::debug!(order_id = %order_id, "Order emails already sent");
            }
            Err(e) => tracing::error!(order_id = %order_id, error = %e, "Order emails failed"),
        }
    }
}

/// Parse the order id carried by a notification.
#[must_use]
pub fn parse_order_id(payload: &str) -> Option<OrderId> {
    payload
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .map(OrderId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_id() {
        assert_eq!(parse_order_id("42"), Some(OrderId::new(42)));
        assert_eq!(parse_order_id(" 7\n"), Some(OrderId::new(7)));
        assert_eq!(parse_order_id("0"), None);
        assert_eq!(parse_order_id("-3"), None);
        assert_eq!(parse_order_id("order-9"), None);
        assert_eq!(parse_order_id(""), None);
    }
}
