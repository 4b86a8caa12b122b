//! Coupon administration.

use sqlx::PgPool;

use marigold_core::coupon::{Coupon, CouponInput, normalize_code};
use marigold_core::CouponId;
use marigold_storefront::db::RepositoryError;
use marigold_storefront::db::coupons::{COUPON_COLUMNS, CouponRow};

/// Coupon CRUD. Usage counts are only ever changed by placed orders.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every coupon, alphabetically by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for negative counters.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows: Vec<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupons ORDER BY code"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Coupon::try_from).collect()
    }

    /// Get one coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this id.
    pub async fn get(&self, id: CouponId) -> Result<Coupon, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Insert a coupon. The code is stored upper-case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        let row: CouponRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shop.coupons
                (code, discount_type, discount_value, min_purchase, starts_at, ends_at, active, usage_limit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(normalize_code(&input.code))
        .bind(input.discount_type)
        .bind(input.discount_value)
        .bind(input.min_purchase)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.active)
        .bind(usage_limit(input))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a coupon with this code"))?;

        row.try_into()
    }

    /// Replace a coupon's terms. The usage count is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the new code is taken.
    pub async fn update(&self, id: CouponId, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            r"
            UPDATE shop.coupons
            SET code = $2, discount_type = $3, discount_value = $4, min_purchase = $5,
                starts_at = $6, ends_at = $7, active = $8, usage_limit = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(id)
        .bind(normalize_code(&input.code))
        .bind(input.discount_type)
        .bind(input.discount_value)
        .bind(input.min_purchase)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.active)
        .bind(usage_limit(input))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a coupon with this code"))?;

        row.map(Coupon::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a coupon. Orders keep the code they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this id.
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.coupons WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Limits beyond the column's range are as good as unlimited.
fn usage_limit(input: &CouponInput) -> Option<i32> {
    input
        .usage_limit
        .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use marigold_core::DiscountType;

    use super::*;

    fn input(limit: Option<u32>) -> CouponInput {
        CouponInput {
            code: "spring".to_owned(),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::new(500, 2),
            min_purchase: None,
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            active: true,
            usage_limit: limit,
        }
    }

    #[test]
    fn test_usage_limit_saturates() {
        assert_eq!(usage_limit(&input(None)), None);
        assert_eq!(usage_limit(&input(Some(25))), Some(25));
        assert_eq!(usage_limit(&input(Some(u32::MAX))), Some(i32::MAX));
    }
}
