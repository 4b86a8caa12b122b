//! Order assembly and submission validation.
//!
//! An order is a snapshot: line items copy title, price and image from the
//! cart at the moment of checkout and never follow later catalog edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::coupon::AppliedCoupon;
use crate::types::{Email, Money, OrderId, OrderStatus, ProductId, UserId};

/// Reasons an order submission is refused before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("order has no items")]
    EmptyItems,
    #[error("order total is not a valid amount: {0}")]
    InvalidTotal(String),
    #[error("shipping name is required")]
    MissingShippingName,
    #[error("payment method is required")]
    MissingPaymentMethod,
    #[error("line item {0} has zero quantity")]
    ZeroQuantity(ProductId),
}

/// One product entry within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl LineItem {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            title: item.title.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
            color: item.color.clone(),
            size: item.size.clone(),
        }
    }
}

/// Where an order ships, and who to contact about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank, plus `"email"` if it does not parse.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("name", &self.name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if Email::parse(&self.email).is_err() {
            missing.push("email");
        }
        missing
    }
}

/// An order ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// `None` for guest checkout.
    pub user_id: Option<UserId>,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub coupon_code: Option<String>,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    /// Unique per checkout attempt; a replay with the same key returns the
    /// existing order instead of writing another.
    pub submission_key: Uuid,
}

/// Everything needed to turn a cart into an order.
#[derive(Debug, Clone)]
pub struct OrderParts<'a> {
    pub cart: &'a Cart,
    pub user_id: Option<UserId>,
    pub shipping_address: ShippingAddress,
    pub payment_method: &'a str,
    pub payment_reference: Option<String>,
    pub coupon: Option<AppliedCoupon>,
    pub submission_key: Uuid,
}

impl NewOrder {
    /// Build an order from cart state, shipping form and payment choice.
    ///
    /// Zero-quantity rows are dropped. The total is the subtotal less any
    /// coupon discount.
    #[must_use]
    pub fn assemble(parts: OrderParts<'_>) -> Self {
        let items: Vec<LineItem> = parts
            .cart
            .items()
            .iter()
            .filter(|i| i.quantity > 0)
            .map(LineItem::from)
            .collect();
        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let (coupon_code, discount_amount) = parts
            .coupon
            .map_or((None, Money::ZERO), |c| (Some(c.code), c.discount.min(subtotal)));

        Self {
            user_id: parts.user_id,
            items,
            subtotal,
            discount_amount,
            coupon_code,
            total_amount: subtotal.saturating_sub(discount_amount),
            shipping_address: parts.shipping_address,
            payment_method: parts.payment_method.trim().to_owned(),
            payment_reference: parts.payment_reference,
            submission_key: parts.submission_key,
        }
    }

    /// Refuse submissions that must not be written.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderError`] found.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }
        if let Some(line) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(OrderError::ZeroQuantity(line.product_id));
        }
        if self.total_amount.is_negative() {
            return Err(OrderError::InvalidTotal(format!(
                "{} is negative",
                self.total_amount
            )));
        }
        let expected = self.subtotal.saturating_sub(self.discount_amount);
        if self.total_amount != expected {
            return Err(OrderError::InvalidTotal(format!(
                "{} does not match subtotal {} less discount {}",
                self.total_amount, self.subtotal, self.discount_amount
            )));
        }
        if self.shipping_address.name.trim().is_empty() {
            return Err(OrderError::MissingShippingName);
        }
        if self.payment_method.trim().is_empty() {
            return Err(OrderError::MissingPaymentMethod);
        }
        Ok(())
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub coupon_code: Option<String>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub submission_key: Uuid,
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// `"guest"` or the user id.
    #[must_use]
    pub fn customer_label(&self) -> String {
        self.user_id.map_or_else(|| "guest".to_owned(), |id| id.to_string())
    }

    /// The contact address, if it parses.
    #[must_use]
    pub fn contact_email(&self) -> Option<Email> {
        Email::parse(&self.shipping_address.email).ok()
    }

    /// Total units across line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Robin Vale".to_owned(),
            email: "robin@example.com".to_owned(),
            phone: None,
            line1: "1 Orchard Row".to_owned(),
            line2: None,
            city: "Portland".to_owned(),
            region: Some("OR".to_owned()),
            postal_code: "97201".to_owned(),
            country: "US".to_owned(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem {
            product_id: ProductId::new(1),
            title: "Mug".to_owned(),
            price: Money::from_cents(1000),
            image: None,
            quantity: 2,
            color: None,
            size: None,
        })
        .add(CartItem {
            product_id: ProductId::new(2),
            title: "Spoon".to_owned(),
            price: Money::from_cents(500),
            image: None,
            quantity: 1,
            color: None,
            size: None,
        });
        cart
    }

    fn parts(cart: &Cart) -> OrderParts<'_> {
        OrderParts {
            cart,
            user_id: None,
            shipping_address: address(),
            payment_method: "cod",
            payment_reference: None,
            coupon: None,
            submission_key: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_assemble_from_cart() {
        let cart = cart();
        let order = NewOrder::assemble(parts(&cart));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, Money::from_cents(2500));
        assert_eq!(order.total_amount, Money::from_cents(2500));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_assemble_applies_coupon() {
        let cart = cart();
        let order = NewOrder::assemble(OrderParts {
            coupon: Some(AppliedCoupon {
                code: "SAVE10".to_owned(),
                discount: Money::from_cents(250),
            }),
            ..parts(&cart)
        });
        assert_eq!(order.discount_amount, Money::from_cents(250));
        assert_eq!(order.total_amount, Money::from_cents(2250));
        assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_assemble_skips_zero_quantity_rows() {
        let mut cart = cart();
        cart.update_quantity(ProductId::new(2), 0);
        let order = NewOrder::assemble(parts(&cart));
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn test_empty_items_rejected() {
        let cart = Cart::new();
        let order = NewOrder::assemble(parts(&cart));
        assert_eq!(order.validate(), Err(OrderError::EmptyItems));
    }

    #[test]
    fn test_tampered_total_rejected() {
        let cart = cart();
        let mut order = NewOrder::assemble(parts(&cart));
        order.total_amount = Money::from_cents(1);
        assert!(matches!(order.validate(), Err(OrderError::InvalidTotal(_))));
        order.total_amount = Money::from_cents(-100);
        assert!(matches!(order.validate(), Err(OrderError::InvalidTotal(_))));
    }

    #[test]
    fn test_missing_name_and_payment_rejected() {
        let cart = cart();
        let mut order = NewOrder::assemble(parts(&cart));
        order.shipping_address.name = "  ".to_owned();
        assert_eq!(order.validate(), Err(OrderError::MissingShippingName));

        let order = NewOrder::assemble(OrderParts {
            payment_method: "",
            ..parts(&cart)
        });
        assert_eq!(order.validate(), Err(OrderError::MissingPaymentMethod));
    }

    #[test]
    fn test_missing_fields() {
        assert!(address().missing_fields().is_empty());
        let partial = ShippingAddress {
            name: "Jo".to_owned(),
            email: "nope".to_owned(),
            ..ShippingAddress::default()
        };
        assert_eq!(
            partial.missing_fields(),
            vec!["line1", "city", "postal_code", "country", "email"]
        );
    }
}
