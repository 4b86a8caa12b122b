//! Coupon validation and discount calculation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CouponId, DiscountType, Money};

/// Reasons a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponError {
    #[error("coupon not found")]
    NotFound,
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid until {0}")]
    NotYetValid(DateTime<Utc>),
    #[error("coupon expired on {0}")]
    Expired(DateTime<Utc>),
    #[error("minimum purchase of {minimum} required")]
    BelowMinimum { minimum: Money },
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("invalid coupon: {0}")]
    Invalid(String),
}

/// A discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Stored upper-case; lookups are case-insensitive.
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage points or a fixed amount, depending on `discount_type`.
    pub discount_value: Decimal,
    pub min_purchase: Option<Money>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
}

/// The outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Money,
}

/// Normalize a user-entered code for lookup and storage.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

impl Coupon {
    /// Check the coupon against a subtotal at `now` and compute the discount.
    ///
    /// Checks run in order: active flag, validity window (inclusive on both
    /// ends), minimum purchase, usage limit. The discount never exceeds the
    /// subtotal.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponError`] that applies.
    pub fn validate(&self, subtotal: Money, now: DateTime<Utc>) -> Result<AppliedCoupon, CouponError> {
        if !self.active {
            return Err(CouponError::Inactive);
        }
        if now < self.starts_at {
            return Err(CouponError::NotYetValid(self.starts_at));
        }
        if now > self.ends_at {
            return Err(CouponError::Expired(self.ends_at));
        }
        if let Some(minimum) = self.min_purchase
            && subtotal < minimum
        {
            return Err(CouponError::BelowMinimum { minimum });
        }
        if let Some(limit) = self.usage_limit
            && self.usage_count >= limit
        {
            return Err(CouponError::UsageLimitReached);
        }

        Ok(AppliedCoupon {
            code: self.code.clone(),
            discount: self.discount_for(subtotal),
        })
    }

    /// The discount on `subtotal`, ignoring eligibility rules.
    #[must_use]
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal.percent(self.discount_value),
            DiscountType::Fixed => Money::new(self.discount_value),
        };
        if raw.is_negative() {
            Money::ZERO
        } else {
            raw.min(subtotal)
        }
    }
}

/// Fields an admin supplies when creating or replacing a coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponInput {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_purchase: Option<Money>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub usage_limit: Option<u32>,
}

const fn default_active() -> bool {
    true
}

impl CouponInput {
    /// Shape validation for admin input.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Invalid`] describing the problem.
    pub fn validate(&self) -> Result<(), CouponError> {
        let code = normalize_code(&self.code);
        if code.is_empty() {
            return Err(CouponError::Invalid("code is required".to_owned()));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(CouponError::Invalid(
                "code may only contain letters, digits, '-' and '_'".to_owned(),
            ));
        }
        if self.discount_value <= Decimal::ZERO {
            return Err(CouponError::Invalid("discount value must be positive".to_owned()));
        }
        if self.discount_type == DiscountType::Percentage && self.discount_value > Decimal::ONE_HUNDRED {
            return Err(CouponError::Invalid("percentage cannot exceed 100".to_owned()));
        }
        if self.ends_at < self.starts_at {
            return Err(CouponError::Invalid("end date precedes start date".to_owned()));
        }
        Ok(())
    }
}
