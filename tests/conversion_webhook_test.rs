use axum::http::StatusCode;
use refledger::api;
use refledger::config::Config;
use refledger::db::init_db;
use refledger::domain::{
    CommissionKind, CouponCode, CouponStatus, DiscountKind, Money, NewCoupon, NewPartner, OrderId,
    PartnerStatus, PayoutPolicy, ReferralCode,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    store: Arc<refledger::Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let store = Arc::new(refledger::Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        signup_redirect_url: "https://shop.example.com/signup".to_string(),
    };

    let state = api::AppState::new(store.clone(), config);
    let app = api::create_router(state);

    TestApp {
        app,
        store,
        _temp: temp_dir,
    }
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn partner(code: &str, policy: PayoutPolicy) -> NewPartner {
    NewPartner {
        name: "Tech Review Blog".to_string(),
        email: format!("{}@example.com", code.to_lowercase()),
        referral_code: ReferralCode::new(code.to_string()),
        status: PartnerStatus::Active,
        commission_rate: Money::from_str_canonical("10").unwrap(),
        commission_kind: CommissionKind::Percentage,
        policy,
    }
}

fn conversion(code: &str, order_id: &str, email: &str, value: &str) -> serde_json::Value {
    serde_json::json!({
        "referralCode": code,
        "orderId": order_id,
        "customerEmail": email,
        "orderValue": value,
    })
}

#[tokio::test]
async fn test_first_conversion_is_approved() {
    let test_app = setup_test_app().await;
    test_app
        .store
        .create_partner(&partner("BLOG10", PayoutPolicy::default()))
        .await
        .unwrap();

    let (status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["duplicate"], false);
    assert_eq!(body["shouldPay"], true);
    assert!(body.get("reason").is_none());
    assert_eq!(body["commission"]["amount"], "10");
    assert_eq!(body["commission"]["rate"], "10");
    assert_eq!(body["commission"]["status"], "approved");
    assert_eq!(body["commission"]["isNewCustomer"], true);
    assert_eq!(body["commission"]["orderId"], "ORD-1001");
    assert_eq!(body["commission"]["customerEmail"], "ana@example.com");
}

#[tokio::test]
async fn test_returning_customer_blocked_when_new_customers_only() {
    let test_app = setup_test_app().await;
    test_app
        .store
        .create_partner(&partner(
            "BLOG10",
            PayoutPolicy {
                new_customers_only: true,
                commission_period_months: 12,
                require_coupon_usage: false,
            },
        ))
        .await
        .unwrap();

    post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;
    let (status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1002", "ana@example.com", "50"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["shouldPay"], false);
    assert_eq!(body["reason"], "new customers only");
    assert_eq!(body["commission"]["status"], "blocked");
    assert_eq!(body["commission"]["blockReason"], "new customers only");
    assert_eq!(body["commission"]["isNewCustomer"], false);
    // Amount is still computed for the blocked record
    assert_eq!(body["commission"]["amount"], "5");
}

#[tokio::test]
async fn test_email_matching_ignores_case_and_whitespace() {
    let test_app = setup_test_app().await;
    test_app
        .store
        .create_partner(&partner(
            "BLOG10",
            PayoutPolicy {
                new_customers_only: true,
                commission_period_months: 12,
                require_coupon_usage: false,
            },
        ))
        .await
        .unwrap();

    post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;
    let (_status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1002", "  Ana@Example.COM ", "50"),
    )
    .await;

    assert_eq!(body["commission"]["isNewCustomer"], false);
    assert_eq!(body["reason"], "new customers only");
}

#[tokio::test]
async fn test_unknown_referral_code_returns_404() {
    let test_app = setup_test_app().await;

    let (status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("NOPE", "ORD-1001", "ana@example.com", "100"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_inactive_partner_returns_400_and_writes_nothing() {
    let test_app = setup_test_app().await;
    let mut p = partner("PAUSED", PayoutPolicy::default());
    p.status = PartnerStatus::Pending;
    test_app.store.create_partner(&p).await.unwrap();

    let (status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("PAUSED", "ORD-1001", "ana@example.com", "100"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(test_app
        .store
        .latest_commission_for_order(&OrderId::new("ORD-1001".to_string()))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_malformed_payload_returns_400() {
    let test_app = setup_test_app().await;

    // missing orderValue
    let (status, _body) = post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        serde_json::json!({
            "referralCode": "BLOG10",
            "orderId": "ORD-1001",
            "customerEmail": "ana@example.com",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // non-positive order value
    let (status, _body) = post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "0"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // unparsable email
    let (status, _body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "not-an-email", "100"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_value_accepts_json_number() {
    let test_app = setup_test_app().await;
    test_app
        .store
        .create_partner(&partner("BLOG10", PayoutPolicy::default()))
        .await
        .unwrap();

    let (status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        serde_json::json!({
            "referralCode": "BLOG10",
            "orderId": "ORD-1001",
            "customerEmail": "ana@example.com",
            "orderValue": 149.99,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commission"]["orderValue"], "149.99");
    assert_eq!(body["commission"]["amount"], "14.999");
}

#[tokio::test]
async fn test_duplicate_order_id_is_not_reprocessed() {
    let test_app = setup_test_app().await;
    let created = test_app
        .store
        .create_partner(&partner("BLOG10", PayoutPolicy::default()))
        .await
        .unwrap();

    let (_s, first) = post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;
    let (status, second) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["duplicate"], true);
    assert_eq!(second["commission"]["id"], first["commission"]["id"]);

    let stored = test_app.store.get_partner(created.id).await.unwrap().unwrap();
    assert_eq!(stored.conversion_count, 1);
    assert_eq!(stored.total_revenue.to_canonical_string(), "100");
}

#[tokio::test]
async fn test_conversion_updates_partner_aggregates() {
    let test_app = setup_test_app().await;
    let created = test_app
        .store
        .create_partner(&partner("BLOG10", PayoutPolicy::default()))
        .await
        .unwrap();

    post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;
    post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1002", "bo@example.com", "49.99"),
    )
    .await;

    let stored = test_app.store.get_partner(created.id).await.unwrap().unwrap();
    assert_eq!(stored.conversion_count, 2);
    assert_eq!(stored.total_revenue.to_canonical_string(), "149.99");
    assert_eq!(stored.total_commissions.to_canonical_string(), "14.999");
}

#[tokio::test]
async fn test_coupon_grants_discount_and_counts_usage() {
    let test_app = setup_test_app().await;
    let created = test_app
        .store
        .create_partner(&partner("SAVER", PayoutPolicy::default()))
        .await
        .unwrap();
    test_app
        .store
        .create_coupon(&NewCoupon {
            partner_id: created.id,
            code: CouponCode::new("SAVE20".to_string()),
            discount_kind: DiscountKind::Percentage,
            discount_value: Money::from_str_canonical("20").unwrap(),
            usage_limit: None,
            status: CouponStatus::Active,
            expires_at: None,
        })
        .await
        .unwrap();

    let mut payload = conversion("SAVER", "ORD-1001", "ana@example.com", "100");
    payload["couponCode"] = serde_json::json!("SAVE20");
    let (status, body) = post_json(test_app.app, "/v1/webhooks/conversion", payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commission"]["couponCode"], "SAVE20");
    assert_eq!(body["commission"]["couponDiscount"], "20");
    assert_eq!(body["commission"]["couponValueRequired"], "20");
    assert_eq!(body["commission"]["couponValueUsed"], "0");

    let coupon = test_app
        .store
        .get_coupon_by_code(&CouponCode::new("SAVE20".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon.usage_count, 1);
}

#[tokio::test]
async fn test_unknown_coupon_is_recorded_with_zero_discount() {
    let test_app = setup_test_app().await;
    test_app
        .store
        .create_partner(&partner("SAVER", PayoutPolicy::default()))
        .await
        .unwrap();

    let mut payload = conversion("SAVER", "ORD-1001", "ana@example.com", "100");
    payload["couponCode"] = serde_json::json!("GHOST");
    let (status, body) = post_json(test_app.app, "/v1/webhooks/conversion", payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shouldPay"], true);
    assert_eq!(body["commission"]["couponCode"], "GHOST");
    assert_eq!(body["commission"]["couponDiscount"], "0");
}

#[tokio::test]
async fn test_fixed_commission_kind_ignores_order_value() {
    let test_app = setup_test_app().await;
    let mut p = partner("FLAT", PayoutPolicy::default());
    p.commission_kind = CommissionKind::Fixed;
    p.commission_rate = Money::from_str_canonical("15").unwrap();
    test_app.store.create_partner(&p).await.unwrap();

    let (_status, body) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("FLAT", "ORD-1001", "ana@example.com", "999"),
    )
    .await;

    assert_eq!(body["commission"]["amount"], "15");
}

#[tokio::test]
async fn test_rate_change_does_not_rewrite_existing_commissions() {
    let test_app = setup_test_app().await;
    let created = test_app
        .store
        .create_partner(&partner("BLOG10", PayoutPolicy::default()))
        .await
        .unwrap();

    let (_s, first) = post_json(
        test_app.app.clone(),
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1001", "ana@example.com", "100"),
    )
    .await;
    assert_eq!(first["commission"]["amount"], "10");

    test_app
        .store
        .update_partner_rate(created.id, Money::from_str_canonical("20").unwrap())
        .await
        .unwrap();
    let (_s, second) = post_json(
        test_app.app,
        "/v1/webhooks/conversion",
        conversion("BLOG10", "ORD-1002", "bo@example.com", "100"),
    )
    .await;

    // New conversion uses the new rate; the old row keeps its snapshot
    assert_eq!(second["commission"]["amount"], "20");
    let old_id = first["commission"]["id"].as_i64().unwrap();
    let old = test_app
        .store
        .get_commission(old_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.amount.to_canonical_string(), "10");
    assert_eq!(old.rate.to_canonical_string(), "10");
}
