//! Order persistence.
//!
//! Orders are written once per `submission_key`. A replayed submission gets
//! the order that was already stored, and coupon usage is only counted for
//! the first write.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use marigold_core::order::{LineItem, NewOrder, Order, ShippingAddress};
use marigold_core::{Money, OrderId, OrderStatus, UserId};

use super::{RepositoryError, coupons};

/// Columns selected for an [`OrderRow`].
pub const ORDER_COLUMNS: &str = "id, user_id, items, subtotal, discount_amount, coupon_code, \
     total_amount, status, shipping_address, payment_method, payment_reference, \
     submission_key, confirmation_sent_at, created_at, updated_at";

/// A `shop.orders` row.
#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub items: Json<Vec<LineItem>>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub coupon_code: Option<String>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: Json<ShippingAddress>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub submission_key: Uuid,
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            items: r.items.0,
            subtotal: r.subtotal,
            discount_amount: r.discount_amount,
            coupon_code: r.coupon_code,
            total_amount: r.total_amount,
            status: r.status,
            shipping_address: r.shipping_address.0,
            payment_method: r.payment_method,
            payment_reference: r.payment_reference,
            submission_key: r.submission_key,
            confirmation_sent_at: r.confirmation_sent_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Result of [`OrderRepository::insert`].
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// A new row was written.
    Created(Order),
    /// The submission key was already used; this is the stored order.
    Existing(Order),
}

impl InsertOutcome {
    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Created(o) | Self::Existing(o) => o,
        }
    }

    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write an order, or return the one already stored under its key.
    ///
    /// When a coupon is attached, its usage is counted in the same
    /// transaction so an exhausted coupon rolls the order back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the coupon ran out meanwhile.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn insert(&self, order: &NewOrder) -> Result<InsertOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            INSERT INTO shop.orders (
                user_id, items, subtotal, discount_amount, coupon_code, total_amount,
                shipping_address, payment_method, payment_reference, submission_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (submission_key) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(order.coupon_code.as_deref())
        .bind(order.total_amount)
        .bind(Json(&order.shipping_address))
        .bind(&order.payment_method)
        .bind(order.payment_reference.as_deref())
        .bind(order.submission_key)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = inserted else {
            let existing: OrderRow = sqlx::query_as(&format!(
                "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE submission_key = $1"
            ))
            .bind(order.submission_key)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok(InsertOutcome::Existing(existing.into()));
        };

        if let Some(code) = order.coupon_code.as_deref() {
            coupons::record_usage(&mut *tx, code).await?;
        }

        tx.commit().await?;
        Ok(InsertOutcome::Created(row.into()))
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Mark the confirmation as sent if nobody has yet.
    ///
    /// Returns `true` for exactly one caller per order; that caller owns
    /// sending the emails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn claim_confirmation(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let claimed = sqlx::query(
            r"
            UPDATE shop.orders SET confirmation_sent_at = NOW()
            WHERE id = $1 AND confirmation_sent_at IS NULL
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(claimed.rows_affected() == 1)
    }

    /// Undo a claim after the send failed, so another worker can retry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn release_confirmation(&self, id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.orders SET confirmation_sent_at = NULL WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
