//! Order placement.
//!
//! Turns a paid checkout into a stored order: re-checks the coupon against
//! the live record, assembles and validates the order, writes it under the
//! checkout's submission key, then sends the confirmation emails best-effort.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use marigold_core::cart::Cart;
use marigold_core::coupon::{AppliedCoupon, CouponError};
use marigold_core::order::{NewOrder, Order, OrderError, OrderParts, ShippingAddress};
use marigold_core::{Money, UserId};

use crate::db::{CouponRepository, InsertOutcome, OrderRepository, RepositoryError};
use crate::services::email::EmailService;
use crate::services::notifications::{Delivery, deliver_order_emails};

/// Errors from quoting or placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error(transparent)]
    Coupon(#[from] CouponError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for PlaceOrderError {
    fn from(e: RepositoryError) -> Self {
        match e {
            // The only conflict on insert is the coupon running out mid-flight.
            RepositoryError::Conflict(_) => Self::Coupon(CouponError::UsageLimitReached),
            other => Self::Repository(other),
        }
    }
}

/// What the customer will pay for the current cart.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Quote {
    pub subtotal: Money,
    pub coupon: Option<AppliedCoupon>,
    pub total: Money,
}

/// Inputs for [`CheckoutService::place_order`].
#[derive(Debug, Clone)]
pub struct Placement<'a> {
    pub cart: &'a Cart,
    pub user_id: Option<UserId>,
    pub shipping_address: ShippingAddress,
    pub payment_method: &'a str,
    pub payment_reference: Option<String>,
    pub coupon_code: Option<&'a str>,
    pub submission_key: Uuid,
}

/// A stored order and whether this call wrote it.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub replayed: bool,
}

/// Quoting and placement against the database.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    email: &'a EmailService,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService) -> Self {
        Self { pool, email }
    }

    /// Validate a coupon code against a subtotal right now.
    ///
    /// # Errors
    ///
    /// [`CouponError::NotFound`] for unknown codes, otherwise the coupon's
    /// own validation error.
    pub async fn apply_coupon(
        &self,
        code: &str,
        subtotal: Money,
    ) -> Result<AppliedCoupon, PlaceOrderError> {
        let coupon = CouponRepository::new(self.pool)
            .get_by_code(code)
            .await?
            .ok_or(CouponError::NotFound)?;
        Ok(coupon.validate(subtotal, Utc::now())?)
    }

    /// Price the cart with an optional coupon.
    ///
    /// # Errors
    ///
    /// Propagates coupon lookup and validation errors.
    pub async fn quote(
        &self,
        cart: &Cart,
        coupon_code: Option<&str>,
    ) -> Result<Quote, PlaceOrderError> {
        let subtotal = cart.total();
        let coupon = match coupon_code {
            Some(code) => Some(self.apply_coupon(code, subtotal).await?),
            None => None,
        };
        let discount = coupon.as_ref().map_or(Money::ZERO, |c| c.discount.min(subtotal));
        Ok(Quote {
            subtotal,
            total: subtotal.saturating_sub(discount),
            coupon,
        })
    }

    /// Write the order and send its emails.
    ///
    /// Nothing is written when validation fails. A replayed submission key
    /// returns the stored order with `replayed` set and sends nothing.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError` for coupon, validation or database failures.
    /// Email failures are logged, never returned.
    #[tracing::instrument(skip(self, placement), fields(submission_key = %placement.submission_key))]
    pub async fn place_order(&self, placement: Placement<'_>) -> Result<PlacedOrder, PlaceOrderError> {
        let coupon = match placement.coupon_code {
            Some(code) => Some(self.apply_coupon(code, placement.cart.total()).await?),
            None => None,
        };

        let order = NewOrder::assemble(OrderParts {
            cart: placement.cart,
            user_id: placement.user_id,
            shipping_address: placement.shipping_address,
            payment_method: placement.payment_method,
            payment_reference: placement.payment_reference,
            coupon,
            submission_key: placement.submission_key,
        });
        order.validate()?;

        let placed = PlacedOrder::from(OrderRepository::new(self.pool).insert(&order).await?);
        let order = &placed.order;

        if placed.replayed {
            tracing::info!(order_id = %order.id, "Replayed submission, returning stored order");
        } else {
            tracing::info!(
                order_id = %order.id,
                total = %order.total_amount,
                customer = %order.customer_label(),
                "Order placed"
            );
            match deliver_order_emails(self.pool, self.email, order).await {
                Ok(Delivery::Sent) => {}
                Ok(Delivery::AlreadySent) => {
                    tracing::debug!(order_id = %order.id, "Emails sent by the order listener");
                }
                Err(e) => {
                    tracing::warn!(order_id = %order.id, error = %e, "Order emails failed");
                }
            }
        }

        Ok(placed)
    }
}

impl From<InsertOutcome> for PlacedOrder {
    fn from(outcome: InsertOutcome) -> Self {
        let replayed = !outcome.is_created();
        Self {
            order: outcome.into_order(),
            replayed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_conflict_maps_to_usage_limit() {
        let err = PlaceOrderError::from(RepositoryError::Conflict("coupon".to_owned()));
        assert!(matches!(
            err,
            PlaceOrderError::Coupon(CouponError::UsageLimitReached)
        ));
    }

    #[test]
    fn test_not_found_stays_repository_error() {
        let err = PlaceOrderError::from(RepositoryError::NotFound);
        assert!(matches!(err, PlaceOrderError::Repository(RepositoryError::NotFound)));
    }
}
