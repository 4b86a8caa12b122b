//! Live tests against a running storefront.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (`mg-cli migrate`, `mg-cli seed`)
//! - The storefront running (cargo run -p marigold-storefront)
//!
//! Run with: cargo test -p marigold-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use marigold_integration_tests::{first_product_line, session_client, storefront_base_url};

async fn post(client: &Client, path: &str, body: &Value) -> (StatusCode, Value) {
    let base_url = storefront_base_url();
    let resp = client
        .post(format!("{base_url}{path}"))
        .json(body)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_storefront_health() {
    let resp = session_client()
        .get(format!("{}/health/ready", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Cart & Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_cart_survives_between_requests() {
    let client = session_client();
    let add = first_product_line(&client).await;

    let (status, cart) = post(&client, "/api/cart/items", &add).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["item_count"], 1);

    let cart: Value = client
        .get(format!("{}/api/cart", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart["item_count"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_guest_cash_on_delivery_checkout() {
    let client = session_client();
    let add = first_product_line(&client).await;
    let (status, _) = post(&client, "/api/cart/items", &add).await;
    assert_eq!(status, StatusCode::OK);

    let (status, wizard) = post(&client, "/api/checkout/start", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wizard["step"], "shipping");

    let (status, wizard) = post(
        &client,
        "/api/checkout/shipping",
        &json!({
            "name": "Robin Vale",
            "email": "robin@example.com",
            "line1": "12 Orchard Lane",
            "city": "Portland",
            "postal_code": "97201",
            "country": "US",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wizard["step"], "payment");

    let (status, placed) = post(&client, "/api/checkout/pay/cod", &json!({})).await;
    assert_eq!(status, StatusCode::OK, "{placed}");
    assert_eq!(placed["replayed"], false);
    assert_eq!(placed["order"]["status"], "pending");
    assert_eq!(placed["order"]["payment_method"], "cod");

    // The wizard is closed and the cart emptied.
    let (status, _) = post(&client, "/api/checkout/pay/cod", &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let order_id = placed["order"]["id"].as_i64().expect("order id");
    let resp = client
        .get(format!("{}/api/orders/{order_id}", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_coupon_is_rejected() {
    let client = session_client();
    let resp = client
        .put(format!("{}/api/checkout/coupon", storefront_base_url()))
        .json(&json!({ "code": "NO-SUCH-CODE" }))
        .send()
        .await
        .expect("Failed to apply coupon");
    assert!(resp.status().is_client_error());
}

// ============================================================================
// Blog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_blog_lists_published_posts_only() {
    let posts: Value = session_client()
        .get(format!("{}/api/blog", storefront_base_url()))
        .send()
        .await
        .expect("Failed to list posts")
        .json()
        .await
        .expect("Failed to parse posts");

    for post in posts.as_array().expect("array of posts") {
        assert!(post["published_at"].is_string(), "{post}");
    }
}
