//! The checkout wizard.
//!
//! `Cart → Shipping → Payment → Confirmation`, advancing one step at a time.
//! Two guard flags mirror what the storefront exposes to the page:
//! `form_submitted` is set while a submission is in flight and
//! `order_complete` once an order has been written. Every wizard carries a
//! `submission_key` that the order table holds under a unique constraint, so
//! the guard survives two tabs racing on the same session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::order::{OrderError, ShippingAddress};
use crate::payment::{PaymentError, PaymentMethod};
use crate::types::OrderId;

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Cart,
    Shipping,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// 1-based position shown in the progress indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Cart => 1,
            Self::Shipping => 2,
            Self::Payment => 3,
            Self::Confirmation => 4,
        }
    }
}

/// Errors raised by wizard transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,
    #[error("shipping details incomplete: {}", .0.join(", "))]
    InvalidShipping(Vec<String>),
    #[error("cannot go from {from:?} to {to:?}")]
    OutOfOrder { from: CheckoutStep, to: CheckoutStep },
    #[error("an order submission is already in progress")]
    AlreadySubmitting,
    #[error("this order has already been placed")]
    AlreadyComplete,
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Wizard state, held in the visitor's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    step: CheckoutStep,
    shipping: Option<ShippingAddress>,
    payment_method: Option<PaymentMethod>,
    coupon_code: Option<String>,
    form_submitted: bool,
    order_complete: bool,
    submission_key: Uuid,
    order_id: Option<OrderId>,
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkout {
    /// A fresh wizard at the cart step with a new submission key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: CheckoutStep::Cart,
            shipping: None,
            payment_method: None,
            coupon_code: None,
            form_submitted: false,
            order_complete: false,
            submission_key: Uuid::new_v4(),
            order_id: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> Option<&ShippingAddress> {
        self.shipping.as_ref()
    }

    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    #[must_use]
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    #[must_use]
    pub const fn form_submitted(&self) -> bool {
        self.form_submitted
    }

    #[must_use]
    pub const fn order_complete(&self) -> bool {
        self.order_complete
    }

    #[must_use]
    pub const fn submission_key(&self) -> Uuid {
        self.submission_key
    }

    /// The placed order, once complete.
    #[must_use]
    pub const fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    fn ensure_open(&self) -> Result<(), CheckoutError> {
        if self.order_complete {
            return Err(CheckoutError::AlreadyComplete);
        }
        if self.form_submitted {
            return Err(CheckoutError::AlreadySubmitting);
        }
        Ok(())
    }

    /// Remember a coupon code to apply at placement, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Fails once submission has started.
    pub fn set_coupon(&mut self, code: Option<String>) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        self.coupon_code = code;
        Ok(())
    }

    /// Cart → Shipping.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] when there is nothing to pay for.
    pub fn proceed_to_shipping(&mut self, cart: &Cart) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::Cart {
            return Err(CheckoutError::OutOfOrder {
                from: self.step,
                to: CheckoutStep::Shipping,
            });
        }
        if cart.is_checkout_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Shipping → Payment, keeping the submitted address.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidShipping`] listing the fields that need attention.
    pub fn submit_shipping(&mut self, address: ShippingAddress) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::Shipping {
            return Err(CheckoutError::OutOfOrder {
                from: self.step,
                to: CheckoutStep::Payment,
            });
        }
        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::InvalidShipping(
                missing.into_iter().map(str::to_owned).collect(),
            ));
        }
        self.shipping = Some(address);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Step back one screen. Not possible after confirmation.
    ///
    /// # Errors
    ///
    /// Fails while a submission is in flight or after completion.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        self.step = match self.step {
            CheckoutStep::Cart | CheckoutStep::Shipping => CheckoutStep::Cart,
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Confirmation => return Err(CheckoutError::AlreadyComplete),
        };
        Ok(self.step)
    }

    /// Set `form_submitted` and hand back the submission key.
    ///
    /// # Errors
    ///
    /// Refuses a second submission while one is in flight, after completion,
    /// outside the payment step, or with an empty cart.
    pub fn begin_submission(
        &mut self,
        cart: &Cart,
        method: PaymentMethod,
    ) -> Result<Uuid, CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::OutOfOrder {
                from: self.step,
                to: CheckoutStep::Confirmation,
            });
        }
        if cart.is_checkout_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.payment_method = Some(method);
        self.form_submitted = true;
        Ok(self.submission_key)
    }

    /// The write failed; clear the in-flight flag so the customer can retry.
    pub const fn fail_submission(&mut self) {
        self.form_submitted = false;
    }

    /// The order was written.
    pub const fn complete(&mut self, order_id: OrderId) {
        self.form_submitted = false;
        self.order_complete = true;
        self.order_id = Some(order_id);
        self.step = CheckoutStep::Confirmation;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::order::tests::address;
    use crate::types::{Money, ProductId};

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem {
            product_id: ProductId::new(1),
            title: "Mug".to_owned(),
            price: Money::from_cents(1000),
            image: None,
            quantity: 1,
            color: None,
            size: None,
        });
        cart
    }

    fn at_payment() -> Checkout {
        let mut checkout = Checkout::new();
        checkout.proceed_to_shipping(&cart()).unwrap();
        checkout.submit_shipping(address()).unwrap();
        checkout
    }

    #[test]
    fn test_happy_path() {
        let mut checkout = at_payment();
        assert_eq!(checkout.step(), CheckoutStep::Payment);
        let key = checkout.begin_submission(&cart(), PaymentMethod::Cod).unwrap();
        assert_eq!(key, checkout.submission_key());
        assert!(checkout.form_submitted());

        checkout.complete(OrderId::new(7));
        assert_eq!(checkout.step(), CheckoutStep::Confirmation);
        assert!(checkout.order_complete());
        assert!(!checkout.form_submitted());
        assert_eq!(checkout.order_id(), Some(OrderId::new(7)));
    }

    #[test]
    fn test_empty_cart_cannot_advance() {
        let mut checkout = Checkout::new();
        assert_eq!(
            checkout.proceed_to_shipping(&Cart::new()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut checkout = Checkout::new();
        assert!(matches!(
            checkout.submit_shipping(address()),
            Err(CheckoutError::OutOfOrder { .. })
        ));
        assert!(matches!(
            checkout.begin_submission(&cart(), PaymentMethod::Card),
            Err(CheckoutError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_invalid_shipping_lists_fields() {
        let mut checkout = Checkout::new();
        checkout.proceed_to_shipping(&cart()).unwrap();
        let err = checkout
            .submit_shipping(ShippingAddress {
                city: String::new(),
                ..address()
            })
            .unwrap_err();
        assert_eq!(err, CheckoutError::InvalidShipping(vec!["city".to_owned()]));
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_second_submit_refused_while_in_flight() {
        let mut checkout = at_payment();
        checkout.begin_submission(&cart(), PaymentMethod::Cod).unwrap();
        assert_eq!(
            checkout.begin_submission(&cart(), PaymentMethod::Cod),
            Err(CheckoutError::AlreadySubmitting)
        );
    }

    #[test]
    fn test_failure_resets_guard_and_keeps_key() {
        let mut checkout = at_payment();
        let first = checkout.begin_submission(&cart(), PaymentMethod::Card).unwrap();
        checkout.fail_submission();
        let second = checkout.begin_submission(&cart(), PaymentMethod::Card).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_refused_after_complete() {
        let mut checkout = at_payment();
        checkout.begin_submission(&cart(), PaymentMethod::Cod).unwrap();
        checkout.complete(OrderId::new(1));
        assert_eq!(
            checkout.begin_submission(&cart(), PaymentMethod::Cod),
            Err(CheckoutError::AlreadyComplete)
        );
        assert_eq!(checkout.back(), Err(CheckoutError::AlreadyComplete));
    }

    #[test]
    fn test_back() {
        let mut checkout = at_payment();
        assert_eq!(checkout.back().unwrap(), CheckoutStep::Shipping);
        assert_eq!(checkout.back().unwrap(), CheckoutStep::Cart);
        assert_eq!(checkout.back().unwrap(), CheckoutStep::Cart);
    }

    #[test]
    fn test_new_wizards_get_distinct_keys() {
        assert_ne!(Checkout::new().submission_key(), Checkout::new().submission_key());
    }
}
