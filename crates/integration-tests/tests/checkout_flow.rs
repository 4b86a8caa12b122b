//! End-to-end domain flow: cart → checkout wizard → order → dashboard.
//!
//! These exercise the core crate the way the storefront handlers chain it,
//! without a database or HTTP server.

#![allow(clippy::unwrap_used)]

use marigold_core::analytics;
use marigold_core::cart::{Cart, CartAction, CartKey};
use marigold_core::checkout::{Checkout, CheckoutError, CheckoutStep};
use marigold_core::order::{NewOrder, OrderError, OrderParts};
use marigold_core::payment::PaymentMethod;
use marigold_core::{Money, OrderId, OrderStatus, ProductId};
use marigold_integration_tests::{
    cart_with, guest_order, item, june, persisted, shipping_address, variant,
};

// ============================================================================
// Cart
// ============================================================================

#[test]
fn test_cart_totals_follow_every_action() {
    let mut cart = cart_with([item(1, "Linen Apron", 1000, 2), item(2, "Tea Towel", 500, 1)]);
    assert_eq!(cart.total(), Money::from_cents(2500));

    cart.update_quantity(ProductId::new(1), 3);
    assert_eq!(cart.total(), Money::from_cents(3500));

    cart.remove(ProductId::new(2));
    assert_eq!(cart.total(), Money::from_cents(3000));
    assert_eq!(cart.item_count(), 3);
}

#[test]
fn test_variants_are_separate_rows_until_removed_by_product() {
    let mut cart = cart_with([
        variant(7, "Canvas Tote", 2400, 1, "sand", "M"),
        variant(7, "Canvas Tote", 2400, 2, "sand", "M"),
        variant(7, "Canvas Tote", 2400, 1, "olive", "M"),
    ]);
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.item_count(), 4);

    cart.apply(CartAction::RemoveVariant(CartKey {
        product_id: ProductId::new(7),
        color: Some("olive".to_owned()),
        size: Some("M".to_owned()),
    }));
    assert_eq!(cart.item_count(), 3);

    cart.remove(ProductId::new(7));
    assert!(cart.is_empty());
    assert_eq!(cart.total(), Money::ZERO);
}

// ============================================================================
// Wizard
// ============================================================================

#[test]
fn test_wizard_walks_to_confirmation() {
    let cart = cart_with([item(1, "Linen Apron", 3800, 1)]);
    let mut checkout = Checkout::new();
    assert_eq!(checkout.step(), CheckoutStep::Cart);

    checkout.proceed_to_shipping(&cart).unwrap();
    checkout.submit_shipping(shipping_address()).unwrap();
    assert_eq!(checkout.step(), CheckoutStep::Payment);

    let key = checkout.begin_submission(&cart, PaymentMethod::Cod).unwrap();
    assert!(checkout.form_submitted());
    assert_eq!(key, checkout.submission_key());

    checkout.complete(OrderId::new(41));
    assert_eq!(checkout.step(), CheckoutStep::Confirmation);
    assert!(checkout.order_complete());
    assert!(!checkout.form_submitted());
    assert_eq!(checkout.order_id(), Some(OrderId::new(41)));
}

#[test]
fn test_wizard_blocks_double_submission() {
    let cart = cart_with([item(1, "Linen Apron", 3800, 1)]);
    let mut checkout = Checkout::new();
    checkout.proceed_to_shipping(&cart).unwrap();
    checkout.submit_shipping(shipping_address()).unwrap();

    checkout.begin_submission(&cart, PaymentMethod::Card).unwrap();
    assert_eq!(
        checkout.begin_submission(&cart, PaymentMethod::Card),
        Err(CheckoutError::AlreadySubmitting)
    );
    assert_eq!(checkout.back(), Err(CheckoutError::AlreadySubmitting));

    // A failed write lets the customer retry with the same key.
    let key = checkout.submission_key();
    checkout.fail_submission();
    assert_eq!(checkout.begin_submission(&cart, PaymentMethod::Card), Ok(key));

    checkout.complete(OrderId::new(1));
    assert_eq!(
        checkout.begin_submission(&cart, PaymentMethod::Card),
        Err(CheckoutError::AlreadyComplete)
    );
}

#[test]
fn test_wizard_reports_missing_shipping_fields() {
    let cart = cart_with([item(1, "Linen Apron", 3800, 1)]);
    let mut checkout = Checkout::new();
    checkout.proceed_to_shipping(&cart).unwrap();

    let mut address = shipping_address();
    address.city = "  ".to_owned();
    address.email = "not-an-email".to_owned();

    let Err(CheckoutError::InvalidShipping(fields)) = checkout.submit_shipping(address) else {
        panic!("expected invalid shipping");
    };
    assert_eq!(fields, vec!["city".to_owned(), "email".to_owned()]);
    assert_eq!(checkout.step(), CheckoutStep::Shipping);
}

#[test]
fn test_emptied_cart_cannot_be_submitted() {
    let mut cart = cart_with([item(1, "Linen Apron", 3800, 1)]);
    let mut checkout = Checkout::new();
    checkout.proceed_to_shipping(&cart).unwrap();
    checkout.submit_shipping(shipping_address()).unwrap();

    cart.update_quantity(ProductId::new(1), 0);
    assert_eq!(
        checkout.begin_submission(&cart, PaymentMethod::Cod),
        Err(CheckoutError::EmptyCart)
    );
    assert!(!checkout.form_submitted());
}

// ============================================================================
// Order assembly
// ============================================================================

#[test]
fn test_order_snapshots_cart_and_drops_zero_rows() {
    let mut cart = cart_with([item(1, "Linen Apron", 1000, 2), item(2, "Tea Towel", 500, 1)]);
    cart.update_quantity(ProductId::new(2), 0);

    let order = guest_order(&cart);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.subtotal, Money::from_cents(2000));
    assert_eq!(order.total_amount, Money::from_cents(2000));
    assert_eq!(order.payment_method, "cod");
    assert!(order.validate().is_ok());
}

#[test]
fn test_order_validation_refuses_bad_submissions() {
    let empty = guest_order(&Cart::new());
    assert_eq!(empty.validate(), Err(OrderError::EmptyItems));

    let cart = cart_with([item(1, "Linen Apron", 1000, 1)]);
    let mut nameless = shipping_address();
    nameless.name = String::new();
    let order = NewOrder::assemble(OrderParts {
        cart: &cart,
        user_id: None,
        shipping_address: nameless,
        payment_method: " ",
        payment_reference: None,
        coupon: None,
        submission_key: uuid::Uuid::new_v4(),
    });
    assert_eq!(order.validate(), Err(OrderError::MissingShippingName));

    let mut tampered = guest_order(&cart);
    tampered.total_amount = Money::from_cents(1);
    assert!(matches!(tampered.validate(), Err(OrderError::InvalidTotal(_))));
}

// ============================================================================
// Dashboard
// ============================================================================

#[test]
fn test_dashboard_over_a_day_of_orders() {
    let aprons = cart_with([item(1, "Linen Apron", 1000, 2)]);
    let towels = cart_with([item(2, "Tea Towel", 500, 3), item(1, "Linen Apron", 1000, 1)]);

    let orders = vec![
        persisted(guest_order(&aprons), 1, OrderStatus::Delivered, june(1)),
        persisted(guest_order(&towels), 2, OrderStatus::Pending, june(1)),
        persisted(guest_order(&aprons), 3, OrderStatus::Shipped, june(2)),
        persisted(guest_order(&towels), 4, OrderStatus::Cancelled, june(2)),
    ];

    let summary = analytics::summarize(&orders, 5);

    assert_eq!(summary.order_count, 3);
    assert_eq!(summary.revenue, Money::from_cents(6500));
    assert_eq!(summary.average_order_value, Money::from_cents(2167));
    assert_eq!(
        summary.revenue_by_date.get(&june(1).date_naive()),
        Some(&Money::from_cents(4500))
    );
    assert_eq!(
        summary.revenue_by_date.get(&june(2).date_naive()),
        Some(&Money::from_cents(2000))
    );
    assert_eq!(summary.status_counts.get("cancelled"), Some(&1));
    assert_eq!(summary.status_counts.get("processing"), Some(&0));

    let top: Vec<(ProductId, u32)> = summary
        .top_products
        .iter()
        .map(|p| (p.product_id, p.quantity))
        .collect();
    assert_eq!(top, vec![(ProductId::new(1), 5), (ProductId::new(2), 3)]);
}
