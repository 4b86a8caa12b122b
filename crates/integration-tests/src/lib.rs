//! Integration tests for Marigold.
//!
//! # Running Tests
//!
//! ```bash
//! # Domain flows (no services needed)
//! cargo test -p marigold-integration-tests
//!
//! # Live API tests against running servers
//! cargo run -p marigold-cli --bin mg-cli -- migrate
//! cargo run -p marigold-cli --bin mg-cli -- seed --file seed.yaml
//! cargo run -p marigold-storefront &
//! cargo run -p marigold-admin &
//! cargo test -p marigold-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart, wizard, order assembly and analytics together
//! - `coupons` - Coupon rules applied to real carts
//! - `storefront_api` - Live storefront API (ignored by default)
//! - `admin_api` - Live admin API (ignored by default)
//! - `order_replay` - Duplicate submissions across both servers (ignored by default)
//!
//! The live tests read `STOREFRONT_BASE_URL` and `ADMIN_BASE_URL`; the admin
//! tests also need `ADMIN_TEST_EMAIL` and `ADMIN_TEST_PASSWORD` for an
//! account created with `mg-cli admin create`.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use uuid::Uuid;

use marigold_core::cart::{Cart, CartItem};
use marigold_core::order::{NewOrder, Order, OrderParts, ShippingAddress};
use marigold_core::{Money, OrderId, OrderStatus, ProductId};

/// A cart row with no variant.
#[must_use]
pub fn item(product_id: i32, title: &str, price_cents: i64, quantity: u32) -> CartItem {
    CartItem {
        product_id: ProductId::new(product_id),
        title: title.to_owned(),
        price: Money::from_cents(price_cents),
        image: None,
        quantity,
        color: None,
        size: None,
    }
}

/// A cart row for one color/size variant.
#[must_use]
pub fn variant(
    product_id: i32,
    title: &str,
    price_cents: i64,
    quantity: u32,
    color: &str,
    size: &str,
) -> CartItem {
    CartItem {
        color: Some(color.to_owned()),
        size: Some(size.to_owned()),
        ..item(product_id, title, price_cents, quantity)
    }
}

/// A cart holding the given rows.
#[must_use]
pub fn cart_with(items: impl IntoIterator<Item = CartItem>) -> Cart {
    let mut cart = Cart::new();
    for item in items {
        cart.add(item);
    }
    cart
}

/// A complete shipping form.
#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        name: "Robin Vale".to_owned(),
        email: "robin@example.com".to_owned(),
        phone: Some("+1 555 0100".to_owned()),
        line1: "12 Orchard Lane".to_owned(),
        line2: None,
        city: "Portland".to_owned(),
        region: Some("OR".to_owned()),
        postal_code: "97201".to_owned(),
        country: "US".to_owned(),
    }
}

/// Assemble a guest cash-on-delivery order from a cart.
#[must_use]
pub fn guest_order(cart: &Cart) -> NewOrder {
    NewOrder::assemble(OrderParts {
        cart,
        user_id: None,
        shipping_address: shipping_address(),
        payment_method: "cod",
        payment_reference: None,
        coupon: None,
        submission_key: Uuid::new_v4(),
    })
}

/// Midnight UTC on the given day of June 2026.
///
/// # Panics
///
/// Panics for days June does not have.
#[must_use]
pub fn june(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, day, 0, 0, 0)
        .single()
        .expect("valid June date")
}

/// The row the database would hand back for `order`.
#[must_use]
pub fn persisted(
    order: NewOrder,
    id: i32,
    status: OrderStatus,
    created_at: DateTime<Utc>,
) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: order.user_id,
        items: order.items,
        subtotal: order.subtotal,
        discount_amount: order.discount_amount,
        coupon_code: order.coupon_code,
        total_amount: order.total_amount,
        status,
        shipping_address: order.shipping_address,
        payment_method: order.payment_method,
        payment_reference: order.payment_reference,
        submission_key: order.submission_key,
        confirmation_sent_at: None,
        created_at,
        updated_at: created_at,
    }
}

/// Base URL of a running storefront.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of a running admin.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// An add-to-cart body for one unit of the first listed product.
///
/// # Panics
///
/// Panics if the storefront is unreachable or the catalog is empty.
pub async fn first_product_line(client: &Client) -> serde_json::Value {
    let products: serde_json::Value = client
        .get(format!("{}/api/products?limit=1", storefront_base_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");

    let product = products
        .get(0)
        .cloned()
        .expect("No products; seed the database first");
    let variation = product["variations"]
        .get(0)
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    serde_json::json!({
        "product_id": product["id"],
        "quantity": 1,
        "color": variation["color"],
        "size": variation["size"],
    })
}

/// A client holding a signed-in admin session for `ADMIN_TEST_EMAIL`.
///
/// # Panics
///
/// Panics if the credentials are not set or sign-in fails.
pub async fn admin_session() -> Client {
    let email = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    let password = std::env::var("ADMIN_TEST_PASSWORD").expect("ADMIN_TEST_PASSWORD not set");

    let client = session_client();
    let resp = client
        .post(format!("{}/api/auth/login", admin_base_url()))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to sign in");
    assert!(resp.status().is_success(), "admin sign-in failed: {}", resp.status());
    client
}
