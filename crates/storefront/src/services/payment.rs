//! Demo payment processing.
//!
//! No money moves. The card path validates the form, waits a configurable
//! delay and approves; the hosted path hands out a reference on *create* and
//! checks it on *approve*.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

use marigold_core::Money;
use marigold_core::payment::{CardDetails, CardSummary, HostedCheckout, PaymentError};

/// A successful payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub reference: String,
    pub card: Option<CardSummary>,
}

/// The demo processor.
#[derive(Debug, Clone)]
pub struct PaymentService {
    card_delay: Duration,
}

impl PaymentService {
    #[must_use]
    pub const fn new(card_delay: Duration) -> Self {
        Self { card_delay }
    }

    /// Validate the card form and approve after the configured delay.
    ///
    /// # Errors
    ///
    /// Returns the card's [`PaymentError`] if the form is invalid.
    #[tracing::instrument(skip(self, card), fields(amount = %amount))]
    pub async fn charge_card(
        &self,
        card: &CardDetails,
        amount: Money,
    ) -> Result<PaymentReceipt, PaymentError> {
        let summary = card.validate(Utc::now().date_naive())?;
        tokio::time::sleep(self.card_delay).await;
        tracing::info!(last4 = %summary.last4, "Demo card approved");
        Ok(PaymentReceipt {
            reference: generate_reference("card"),
            card: Some(summary),
        })
    }

    /// Open a hosted checkout for `amount`.
    #[must_use]
    pub fn create_hosted(&self, amount: Money) -> HostedCheckout {
        HostedCheckout {
            reference: generate_reference("hosted"),
            amount,
        }
    }

    /// Approve a hosted checkout opened earlier in this session.
    ///
    /// # Errors
    ///
    /// [`PaymentError::NoHostedCheckout`] without a pending checkout, or the
    /// mismatch reported by [`HostedCheckout::approve`].
    pub fn approve_hosted(
        &self,
        pending: Option<&HostedCheckout>,
        reference: &str,
        current_total: Money,
    ) -> Result<PaymentReceipt, PaymentError> {
        let pending = pending.ok_or(PaymentError::NoHostedCheckout)?;
        pending.approve(reference, current_total)?;
        Ok(PaymentReceipt {
            reference: pending.reference.clone(),
            card: None,
        })
    }
}

/// `{prefix}_` followed by 16 random alphanumerics.
fn generate_reference(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card(number: &str) -> CardDetails {
        CardDetails {
            number: number.to_owned(),
            expiry: "12/99".to_owned(),
            cvc: "123".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_charge_card_approves_valid_card() {
        let service = PaymentService::new(Duration::ZERO);
        let receipt = service
            .charge_card(&card("4242 4242 4242 4242"), Money::from_cents(1000))
            .await
            .unwrap();
        assert!(receipt.reference.starts_with("card_"));
        assert_eq!(receipt.card.unwrap().last4, "4242");
    }

    #[tokio::test]
    async fn test_charge_card_rejects_bad_checksum() {
        let service = PaymentService::new(Duration::ZERO);
        let err = service
            .charge_card(&card("4242 4242 4242 4241"), Money::from_cents(1000))
            .await
            .unwrap_err();
        assert_eq!(err, PaymentError::ChecksumFailed);
    }

    #[test]
    fn test_hosted_create_then_approve() {
        let service = PaymentService::new(Duration::ZERO);
        let total = Money::from_cents(4_500);
        let pending = service.create_hosted(total);
        assert!(pending.reference.starts_with("hosted_"));

        let receipt = service
            .approve_hosted(Some(&pending), &pending.reference, total)
            .unwrap();
        assert_eq!(receipt.reference, pending.reference);
        assert!(receipt.card.is_none());
    }

    #[test]
    fn test_hosted_approve_requires_pending_checkout() {
        let service = PaymentService::new(Duration::ZERO);
        assert_eq!(
            service
                .approve_hosted(None, "hosted_x", Money::ZERO)
                .unwrap_err(),
            PaymentError::NoHostedCheckout
        );
    }

    #[test]
    fn test_references_are_unique() {
        assert_ne!(generate_reference("card"), generate_reference("card"));
        assert_eq!(generate_reference("card").len(), "card_".len() + 16);
    }
}
