//! Coupons applied to real carts and carried onto orders.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use rust_decimal::Decimal;
use uuid::Uuid;

use marigold_core::analytics;
use marigold_core::coupon::{Coupon, CouponError, normalize_code};
use marigold_core::order::{NewOrder, OrderParts};
use marigold_core::{CouponId, DiscountType, Money, OrderStatus};
use marigold_integration_tests::{cart_with, item, june, persisted, shipping_address};

fn save10() -> Coupon {
    Coupon {
        id: CouponId::new(1),
        code: "SAVE10".to_owned(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(10),
        min_purchase: Some(Money::from_cents(2000)),
        starts_at: june(1),
        ends_at: june(30),
        active: true,
        usage_limit: Some(100),
        usage_count: 0,
    }
}

#[test]
fn test_save10_on_a_hundred_dollar_cart() {
    let cart = cart_with([item(1, "Wool Throw", 10_000, 1)]);
    let applied = save10().validate(cart.total(), june(15)).unwrap();

    assert_eq!(applied.code, "SAVE10");
    assert_eq!(applied.discount, Money::from_cents(1000));

    let order = NewOrder::assemble(OrderParts {
        cart: &cart,
        user_id: None,
        shipping_address: shipping_address(),
        payment_method: "card",
        payment_reference: Some("demo-4242".to_owned()),
        coupon: Some(applied),
        submission_key: Uuid::new_v4(),
    });
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(order.discount_amount, Money::from_cents(1000));
    assert_eq!(order.total_amount, Money::from_cents(9000));
    assert!(order.validate().is_ok());
}

#[test]
fn test_save10_below_minimum_is_rejected() {
    let cart = cart_with([item(2, "Tea Towel", 1500, 1)]);
    assert_eq!(
        save10().validate(cart.total(), june(15)),
        Err(CouponError::BelowMinimum {
            minimum: Money::from_cents(2000)
        })
    );
}

#[test]
fn test_window_is_inclusive_at_both_ends() {
    let coupon = save10();
    let subtotal = Money::from_cents(5000);

    assert!(coupon.validate(subtotal, june(1)).is_ok());
    assert!(coupon.validate(subtotal, june(30)).is_ok());
    assert!(matches!(
        coupon.validate(subtotal, june(1) - Duration::seconds(1)),
        Err(CouponError::NotYetValid(_))
    ));
    assert!(matches!(
        coupon.validate(subtotal, june(30) + Duration::seconds(1)),
        Err(CouponError::Expired(_))
    ));
}

#[test]
fn test_rule_order_inactive_before_limit() {
    let mut coupon = save10();
    coupon.usage_count = 100;
    assert_eq!(
        coupon.validate(Money::from_cents(5000), june(15)),
        Err(CouponError::UsageLimitReached)
    );

    coupon.active = false;
    assert_eq!(
        coupon.validate(Money::from_cents(5000), june(15)),
        Err(CouponError::Inactive)
    );
}

#[test]
fn test_fixed_discount_never_exceeds_subtotal() {
    let coupon = Coupon {
        code: "TAKE50".to_owned(),
        discount_type: DiscountType::Fixed,
        discount_value: Decimal::from(50),
        min_purchase: None,
        usage_limit: None,
        ..save10()
    };
    let cart = cart_with([item(3, "Beeswax Wrap", 1200, 2)]);
    let applied = coupon.validate(cart.total(), june(15)).unwrap();
    assert_eq!(applied.discount, Money::from_cents(2400));

    let order = NewOrder::assemble(OrderParts {
        cart: &cart,
        user_id: None,
        shipping_address: shipping_address(),
        payment_method: "cod",
        payment_reference: None,
        coupon: Some(applied),
        submission_key: Uuid::new_v4(),
    });
    assert_eq!(order.total_amount, Money::ZERO);
    assert!(order.validate().is_ok());
}

#[test]
fn test_entered_codes_match_stored_codes() {
    assert_eq!(normalize_code("  save10 "), save10().code);
}

#[test]
fn test_coupon_usage_on_dashboard() {
    let cart = cart_with([item(1, "Wool Throw", 10_000, 1)]);
    let place = |id: i32, status: OrderStatus| {
        let applied = save10().validate(cart.total(), june(15)).unwrap();
        let order = NewOrder::assemble(OrderParts {
            cart: &cart,
            user_id: None,
            shipping_address: shipping_address(),
            payment_method: "cod",
            payment_reference: None,
            coupon: Some(applied),
            submission_key: Uuid::new_v4(),
        });
        persisted(order, id, status, june(15))
    };

    let orders = vec![
        place(1, OrderStatus::Delivered),
        place(2, OrderStatus::Processing),
        place(3, OrderStatus::Cancelled),
    ];
    let usage = analytics::coupon_usage(&orders);

    assert_eq!(usage.len(), 1);
    let save10 = usage.first().unwrap();
    assert_eq!(save10.code, "SAVE10");
    assert_eq!(save10.orders, 2);
    assert_eq!(save10.discount, Money::from_cents(2000));
}
