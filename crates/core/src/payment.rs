//! Payment methods offered at checkout.
//!
//! None of these capture money. The card form is a demo that checks the
//! shape of what was typed; the hosted flow models a processor's
//! create/approve callbacks; cash on delivery always succeeds.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{Money, ParseEnumError};

/// Reasons a payment step fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("card number must be 16 digits")]
    InvalidCardNumber,
    #[error("card number failed checksum")]
    ChecksumFailed,
    #[error("expiry must be MM/YY")]
    InvalidExpiry,
    #[error("card has expired")]
    CardExpired,
    #[error("security code must be 3 or 4 digits")]
    InvalidCvc,
    #[error("no hosted checkout is open")]
    NoHostedCheckout,
    #[error("hosted checkout reference does not match")]
    ReferenceMismatch,
    #[error("cart total changed from {expected} to {actual} since the hosted checkout opened")]
    AmountChanged { expected: Money, actual: Money },
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Demo card form.
    Card,
    /// Processor-hosted button checkout.
    Hosted,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    /// The label stored on the order.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Hosted => "hosted",
            Self::Cod => "cod",
        }
    }

    /// Human-readable name for emails.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Card => "Credit card",
            Self::Hosted => "Hosted checkout",
            Self::Cod => "Cash on delivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "hosted" => Ok(Self::Hosted),
            "cod" => Ok(Self::Cod),
            _ => Err(ParseEnumError {
                kind: "payment method",
                value: s.to_owned(),
            }),
        }
    }
}

/// What the demo card form submits.
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    /// Digits, optionally grouped with spaces or dashes.
    pub number: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvc: String,
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// The safe-to-keep part of a validated card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: i32,
}

impl CardDetails {
    /// Check number, expiry and CVC shape as of `today`.
    ///
    /// A card is valid through the last day of its expiry month.
    ///
    /// # Errors
    ///
    /// Returns the first [`PaymentError`] found.
    pub fn validate(&self, today: NaiveDate) -> Result<CardSummary, PaymentError> {
        let digits: String = self
            .number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if digits.len() != 16 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::InvalidCardNumber);
        }
        if !luhn_valid(&digits) {
            return Err(PaymentError::ChecksumFailed);
        }

        let (exp_month, exp_year) = parse_expiry(&self.expiry)?;
        if (exp_year, exp_month) < (today.year(), today.month()) {
            return Err(PaymentError::CardExpired);
        }

        let cvc = self.cvc.trim();
        if !(3..=4).contains(&cvc.len()) || !cvc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PaymentError::InvalidCvc);
        }

        Ok(CardSummary {
            last4: digits.chars().skip(12).collect(),
            exp_month,
            exp_year,
        })
    }
}

fn parse_expiry(expiry: &str) -> Result<(u32, i32), PaymentError> {
    let (mm, yy) = expiry.trim().split_once('/').ok_or(PaymentError::InvalidExpiry)?;
    let (mm, yy) = (mm.trim(), yy.trim());
    if mm.len() != 2 || yy.len() != 2 {
        return Err(PaymentError::InvalidExpiry);
    }
    let month: u32 = mm.parse().map_err(|_| PaymentError::InvalidExpiry)?;
    let year: i32 = yy.parse().map_err(|_| PaymentError::InvalidExpiry)?;
    if !(1..=12).contains(&month) {
        return Err(PaymentError::InvalidExpiry);
    }
    Ok((month, 2000 + year))
}

/// Luhn checksum over an all-digit string.
#[must_use]
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut d = u32::from(b - b'0');
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

/// A hosted checkout opened by the *create* callback and awaiting *approve*.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedCheckout {
    pub reference: String,
    pub amount: Money,
}

impl HostedCheckout {
    /// Accept the processor's approval if it names this checkout and the
    /// amount still matches the cart.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::ReferenceMismatch`] or
    /// [`PaymentError::AmountChanged`].
    pub fn approve(&self, reference: &str, current_total: Money) -> Result<(), PaymentError> {
        if self.reference != reference {
            return Err(PaymentError::ReferenceMismatch);
        }
        if self.amount != current_total {
            return Err(PaymentError::AmountChanged {
                expected: self.amount,
                actual: current_total,
            });
        }
        Ok(())
    }
}
