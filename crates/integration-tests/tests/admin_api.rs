//! Live tests against a running admin.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`mg-cli migrate`)
//! - An admin account (`mg-cli admin create`) named by `ADMIN_TEST_EMAIL`
//!   and `ADMIN_TEST_PASSWORD`
//! - The admin running (cargo run -p marigold-admin)
//!
//! Run with: cargo test -p marigold-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use marigold_integration_tests::{admin_base_url, admin_session, session_client};

// ============================================================================
// Access
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_api_requires_sign_in() {
    let client = session_client();
    for path in ["/api/products", "/api/orders", "/api/analytics", "/api/settings"] {
        let resp = client
            .get(format!("{}{path}", admin_base_url()))
            .send()
            .await
            .expect("Request failed");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_wrong_password_is_rejected() {
    let resp = session_client()
        .post(format!("{}/api/auth/login", admin_base_url()))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong-password" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Coupons
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_coupon_lifecycle() {
    let client = admin_session().await;
    let base_url = admin_base_url();
    let code = format!("it-{}", Uuid::new_v4().simple());

    let resp = client
        .post(format!("{base_url}/api/coupons"))
        .json(&json!({
            "code": code,
            "discount_type": "percentage",
            "discount_value": "10",
            "min_purchase": "20.00",
            "starts_at": "2026-01-01T00:00:00Z",
            "ends_at": "2026-12-31T23:59:59Z",
        }))
        .send()
        .await
        .expect("Failed to create coupon");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let coupon: Value = resp.json().await.expect("Failed to parse coupon");
    assert_eq!(coupon["code"], code.to_uppercase());
    assert_eq!(coupon["usage_count"], 0);

    // Same code again, in any case, conflicts.
    let resp = client
        .post(format!("{base_url}/api/coupons"))
        .json(&json!({
            "code": code.to_uppercase(),
            "discount_type": "fixed",
            "discount_value": "5",
            "starts_at": "2026-01-01T00:00:00Z",
            "ends_at": "2026-12-31T23:59:59Z",
        }))
        .send()
        .await
        .expect("Failed to post duplicate coupon");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let id = coupon["id"].as_i64().expect("coupon id");
    let resp = client
        .delete(format!("{base_url}/api/coupons/{id}"))
        .send()
        .await
        .expect("Failed to delete coupon");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/api/coupons/{id}"))
        .send()
        .await
        .expect("Failed to get coupon");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_invalid_coupon_is_unprocessable() {
    let client = admin_session().await;
    let resp = client
        .post(format!("{}/api/coupons", admin_base_url()))
        .json(&json!({
            "code": "HALFOFF",
            "discount_type": "percentage",
            "discount_value": "150",
            "starts_at": "2026-01-01T00:00:00Z",
            "ends_at": "2026-12-31T23:59:59Z",
        }))
        .send()
        .await
        .expect("Failed to post coupon");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Orders & Analytics
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_order_status_can_be_set_freely() {
    let client = admin_session().await;
    let base_url = admin_base_url();

    let orders: Value = client
        .get(format!("{base_url}/api/orders?limit=1"))
        .send()
        .await
        .expect("Failed to list orders")
        .json()
        .await
        .expect("Failed to parse orders");
    let Some(order) = orders.get(0) else {
        return; // No orders placed yet
    };
    let id = order["id"].as_i64().expect("order id");
    let original = order["status"].clone();

    for status in ["delivered", "pending", "cancelled", "processing"] {
        let resp = client
            .put(format!("{base_url}/api/orders/{id}/status"))
            .json(&json!({ "status": status }))
            .send()
            .await
            .expect("Failed to set status");
        assert_eq!(resp.status(), StatusCode::OK, "{status}");
    }

    let _ = client
        .put(format!("{base_url}/api/orders/{id}/status"))
        .json(&json!({ "status": original }))
        .send()
        .await;
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_analytics_summary_shape() {
    let client = admin_session().await;
    let summary: Value = client
        .get(format!("{}/api/analytics?top=3", admin_base_url()))
        .send()
        .await
        .expect("Failed to get analytics")
        .json()
        .await
        .expect("Failed to parse analytics");

    assert!(summary["revenue"].is_string());
    assert!(summary["top_products"].as_array().expect("top products").len() <= 3);
    assert_eq!(
        summary["status_counts"].as_object().expect("status counts").len(),
        5
    );
}
