//! Coupon lookups and usage accounting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use marigold_core::coupon::{Coupon, normalize_code};
use marigold_core::{CouponId, DiscountType, Money};

use super::{RepositoryError, count_to_u32};

/// Columns selected for a [`CouponRow`].
pub const COUPON_COLUMNS: &str = "id, code, discount_type, discount_value, min_purchase, \
     starts_at, ends_at, active, usage_limit, usage_count";

/// A `shop.coupons` row.
#[derive(Debug, sqlx::FromRow)]
pub struct CouponRow {
    pub id: CouponId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Option<Money>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(r: CouponRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            code: r.code,
            discount_type: r.discount_type,
            discount_value: r.discount_value,
            min_purchase: r.min_purchase,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            active: r.active,
            usage_limit: r.usage_limit.map(|l| count_to_u32(l, "usage_limit")).transpose()?,
            usage_count: count_to_u32(r.usage_count, "usage_count")?,
        })
    }
}

/// Storefront-side coupon access.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by code, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupons WHERE code = $1"
        ))
        .bind(normalize_code(code))
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }
}

/// Count one redemption, refusing if the limit has been reached meanwhile.
///
/// Runs on the caller's connection so it can share the order's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` when the coupon is exhausted or gone.
pub async fn record_usage(conn: &mut PgConnection, code: &str) -> Result<(), RepositoryError> {
    let updated = sqlx::query(
        r"
        UPDATE shop.coupons
        SET usage_count = usage_count + 1, updated_at = NOW()
        WHERE code = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)
        ",
    )
    .bind(normalize_code(code))
    .execute(conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "coupon {code} is no longer available"
        )));
    }
    Ok(())
}
