use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use chrono::{Duration, Utc};
use shoe_storefront::{router, AppState, Config, Coupon, CouponCode, DiscountType};
use std::str::FromStr;
use tower::util::ServiceExt;

fn app() -> Router {
    router(AppState::in_memory(Config::default()))
}

async fn call(app: &Router, method: Method, uri: &str, session: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri).header("x-session-id", session);
    let request = match body {
        Some(body) => builder.header("content-type", "application/json").body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn amount(money: &Value) -> Decimal {
    Decimal::from_str(money["amount"].as_str().unwrap()).unwrap()
}

async fn add(app: &Router, session: &str, product_id: &str, size: &str, quantity: u32) -> Value {
    let (status, body) = call(app, Method::POST, "/cart", session,
        Some(json!({ "productId": product_id, "size": size, "quantity": quantity }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn address() -> Value {
    json!({ "fullName": "Sita Sharma", "phone": "9841000000", "street": "Durbar Marg", "city": "Kathmandu" })
}

#[tokio::test]
async fn health_check() {
    let (status, body) = call(&app(), Method::GET, "/health", "guest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["events"], false);
}

#[tokio::test]
async fn brand_search_includes_alias_family() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/product?brand=nike&sort=price_asc", "guest", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["nike-pegasus-40", "nike-air-max-90", "jordan-1-mid"]);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let (status, body) = call(&app(), Method::GET, "/product/yeezy-350", "guest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("yeezy-350"));
}

#[tokio::test]
async fn cart_summary_includes_shipping() {
    let app = app();
    add(&app, "s-sum", "puma-suede-classic", "40", 2).await;
    let (_, summary) = call(&app, Method::GET, "/cart/summary", "s-sum", None).await;
    assert_eq!(amount(&summary["subtotal"]), Decimal::from(7000));
    assert_eq!(amount(&summary["shipping"]), Decimal::from(150));
    assert_eq!(amount(&summary["total"]), Decimal::from(7150));
}

#[tokio::test]
async fn sessions_have_separate_carts() {
    let app = app();
    add(&app, "alice", "puma-rs-x", "41", 1).await;
    let (_, bob) = call(&app, Method::GET, "/cart", "bob", None).await;
    assert_eq!(bob["itemCount"], 0);
    assert_eq!(amount(&bob["summary"]["shipping"]), Decimal::ZERO);
}

#[tokio::test]
async fn adding_same_variant_merges_lines() {
    let app = app();
    add(&app, "s-merge", "nike-pegasus-40", "42", 1).await;
    let cart = add(&app, "s-merge", "nike-pegasus-40", "42", 2).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["itemCount"], 3);
}

#[tokio::test]
async fn out_of_stock_product_conflicts() {
    let app = app();
    let (status, _) = call(&app, Method::POST, "/cart", "s-oos",
        Some(json!({ "productId": "vans-old-skool", "size": "40", "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let app = app();
    let cart = add(&app, "s-zero", "puma-rs-x", "41", 1).await;
    let line = cart["items"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, Method::PATCH, &format!("/cart/{line}"), "s-zero", Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = call(&app, Method::PATCH, &format!("/cart/{line}"), "s-zero", Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 3);
}

#[tokio::test]
async fn dashain_requires_minimum_spend() {
    let app = app();
    add(&app, "s-min", "puma-suede-classic", "40", 1).await;
    let (status, body) = call(&app, Method::POST, "/cart/coupon", "s-min", Some(json!({ "code": "dashain50" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Minimum spend of रु5,000 required");
}

#[tokio::test]
async fn dashain_discount_is_capped() {
    let app = app();
    add(&app, "s-cap", "nike-air-max-90", "42", 1).await;
    let (status, cart) = call(&app, Method::POST, "/cart/coupon", "s-cap", Some(json!({ "code": "DASHAIN50" }))).await;
    assert_eq!(status, StatusCode::OK, "{cart}");
    assert_eq!(cart["coupon"]["code"], "DASHAIN50");
    assert_eq!(amount(&cart["summary"]["discount"]), Decimal::from(3000));
    assert_eq!(amount(&cart["summary"]["total"]), Decimal::from(11_650));
}

#[tokio::test]
async fn festival_coupon_is_puma_only() {
    let app = app();
    add(&app, "s-cat", "nike-air-max-90", "42", 1).await;
    let (status, body) = call(&app, Method::POST, "/cart/coupon", "s-cat", Some(json!({ "code": "FESTIVAL15" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "This coupon is only valid for Puma products");
}

#[tokio::test]
async fn expired_exhausted_and_unknown_codes() {
    let app = app();
    add(&app, "s-bad", "nike-air-max-90", "42", 1).await;
    for (code, message) in [
        ("NEWYEAR20", "This coupon has expired"),
        ("FLASH25", "This coupon has reached its usage limit"),
        ("SUMMER30", "Invalid coupon code"),
        ("NOPE", "Invalid coupon code"),
    ] {
        let (status, body) = call(&app, Method::POST, "/cart/coupon", "s-bad", Some(json!({ "code": code }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{code}");
        assert_eq!(body["message"], message, "{code}");
    }
}

#[tokio::test]
async fn buy_two_get_one_counts_jordan_as_nike() {
    let app = app();
    add(&app, "s-b2g1", "nike-pegasus-40", "42", 1).await;
    add(&app, "s-b2g1", "jordan-1-mid", "42", 1).await;
    add(&app, "s-b2g1", "puma-suede-classic", "40", 1).await;
    let (status, cart) = call(&app, Method::POST, "/cart/coupon", "s-b2g1", Some(json!({ "code": "NIKEB2G1" }))).await;
    assert_eq!(status, StatusCode::OK, "{cart}");
    assert_eq!(amount(&cart["summary"]["discount"]), Decimal::from(12_500));
}

#[tokio::test]
async fn coupon_is_dropped_when_cart_empties() {
    let app = app();
    let cart = add(&app, "s-drop", "nike-air-max-90", "42", 1).await;
    let line = cart["items"][0]["id"].as_str().unwrap().to_string();
    call(&app, Method::POST, "/cart/coupon", "s-drop", Some(json!({ "code": "WELCOME10" }))).await;
    let (_, cart) = call(&app, Method::DELETE, &format!("/cart/{line}"), "s-drop", None).await;
    assert!(cart["coupon"].is_null());
    assert_eq!(amount(&cart["summary"]["total"]), Decimal::ZERO);
}

#[tokio::test]
async fn available_coupons_hide_unusable_ones() {
    let (_, body) = call(&app(), Method::GET, "/coupon", "guest", None).await;
    let codes: Vec<&str> = body.as_array().unwrap().iter().map(|c| c["code"].as_str().unwrap()).collect();
    assert!(codes.contains(&"DASHAIN50"));
    assert!(!codes.contains(&"NEWYEAR20"));
    assert!(!codes.contains(&"FLASH25"));
    assert!(!codes.contains(&"SUMMER30"));
}

#[tokio::test]
async fn wishlist_add_is_idempotent_and_moves_to_cart() {
    let app = app();
    let (status, _) = call(&app, Method::POST, "/wishlist", "s-wish", Some(json!({ "productId": "adidas-samba-og" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, items) = call(&app, Method::POST, "/wishlist", "s-wish", Some(json!({ "productId": "adidas-samba-og" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().unwrap().len(), 1);

    let (status, cart) = call(&app, Method::POST, "/wishlist/adidas-samba-og/move-to-cart", "s-wish", Some(json!({ "size": "41" }))).await;
    assert_eq!(status, StatusCode::OK, "{cart}");
    assert_eq!(cart["items"][0]["productId"], "adidas-samba-og");
    let (_, items) = call(&app, Method::GET, "/wishlist", "s-wish", None).await;
    assert!(items.as_array().unwrap().is_empty());

    let (status, _) = call(&app, Method::DELETE, "/wishlist/adidas-samba-og", "s-wish", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn placing_an_order_empties_the_cart_and_counts_redemption() {
    let app = app();
    add(&app, "s-order", "nike-air-max-90", "42", 1).await;
    call(&app, Method::POST, "/cart/coupon", "s-order", Some(json!({ "code": "DASHAIN50" }))).await;

    let (status, order) = call(&app, Method::POST, "/order", "s-order",
        Some(json!({ "email": "sita@example.com", "shippingAddress": address() }))).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["orderNumber"], 1001);
    assert_eq!(amount(&order["summary"]["total"]), Decimal::from(11_650));

    let (_, cart) = call(&app, Method::GET, "/cart", "s-order", None).await;
    assert_eq!(cart["itemCount"], 0);

    let id = order["id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, Method::GET, &format!("/order/{id}"), "someone-else", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cancelled) = call(&app, Method::POST, &format!("/order/{id}/cancel"), "s-order", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    let (status, _) = call(&app, Method::POST, &format!("/order/{id}/cancel"), "s-order", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() {
    let (status, _) = call(&app(), Method::POST, "/order", "s-empty",
        Some(json!({ "email": "sita@example.com", "shippingAddress": address() }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn order_requires_valid_email() {
    let app = app();
    add(&app, "s-email", "puma-rs-x", "41", 1).await;
    let (status, _) = call(&app, Method::POST, "/order", "s-email",
        Some(json!({ "email": "not-an-email", "shippingAddress": address() }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_session_header_is_rejected() {
    let (status, _) = call(&app(), Method::GET, "/cart", "bad session!", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn festival_discount_on_puma_and_removal() {
    let app = app();
    add(&app, "s-puma", "puma-suede-classic", "40", 1).await;
    let (status, cart) = call(&app, Method::POST, "/cart/coupon", "s-puma", Some(json!({ "code": "festival15" }))).await;
    assert_eq!(status, StatusCode::OK, "{cart}");
    assert_eq!(amount(&cart["summary"]["discount"]), Decimal::from(525));
    assert_eq!(amount(&cart["summary"]["total"]), Decimal::from(3125));

    let (status, cart) = call(&app, Method::DELETE, "/cart/coupon", "s-puma", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["coupon"].is_null());
    assert_eq!(amount(&cart["summary"]["discount"]), Decimal::ZERO);
    assert_eq!(amount(&cart["summary"]["total"]), Decimal::from(3650));
}

fn order_body() -> Value {
    json!({ "email": "sita@example.com", "shippingAddress": address() })
}

async fn stock(app: &Router, product_id: &str) -> u64 {
    let (_, product) = call(app, Method::GET, &format!("/product/{product_id}"), "guest", None).await;
    product["stock"].as_u64().unwrap()
}

#[tokio::test]
async fn sizes_of_one_product_share_stock() {
    let app = app();
    add(&app, "s-sizes", "jordan-1-mid", "42", 7).await;
    let (status, _) = call(&app, Method::POST, "/cart", "s-sizes",
        Some(json!({ "productId": "jordan-1-mid", "size": "43", "quantity": 7 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cart) = call(&app, Method::GET, "/cart", "s-sizes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["itemCount"], 7);
}

#[tokio::test]
async fn failed_order_leaves_stock_coupon_and_cart_untouched() {
    let state = AppState::in_memory(Config::default());
    let app = router(state.clone());
    for session in ["first", "second"] {
        add(&app, session, "jordan-1-mid", "42", 7).await;
        let (status, _) = call(&app, Method::POST, "/cart/coupon", session, Some(json!({ "code": "DASHAIN50" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = call(&app, Method::POST, "/order", "first", Some(order_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(stock(&app, "jordan-1-mid").await, 5);

    let (status, body) = call(&app, Method::POST, "/order", "second", Some(order_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "only 5 pairs left in stock");

    assert_eq!(stock(&app, "jordan-1-mid").await, 5);
    assert_eq!(state.coupons.read().await.find("DASHAIN50").unwrap().used_count, 1);
    let (_, orders) = call(&app, Method::GET, "/order", "second", None).await;
    assert!(orders.as_array().unwrap().is_empty());
    let (_, cart) = call(&app, Method::GET, "/cart", "second", None).await;
    assert_eq!(cart["itemCount"], 7);
    assert_eq!(cart["coupon"]["code"], "DASHAIN50");
}

#[tokio::test]
async fn coupon_used_up_before_checkout_blocks_order() {
    let state = AppState::in_memory(Config::default());
    let code = CouponCode::new("LASTPAIR").unwrap();
    state.coupons.write().await.insert(
        Coupon::new(code.clone(), DiscountType::Percentage, Decimal::from(10), Utc::now() + Duration::days(30)).with_usage_limit(1),
    );
    let app = router(state.clone());
    for session in ["early", "late"] {
        add(&app, session, "puma-rs-x", "41", 1).await;
        let (status, _) = call(&app, Method::POST, "/cart/coupon", session, Some(json!({ "code": "lastpair" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = call(&app, Method::POST, "/order", "early", Some(order_body())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::POST, "/order", "late", Some(order_body())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "This coupon has reached its usage limit");
    assert_eq!(stock(&app, "puma-rs-x").await, 17);
    assert_eq!(state.coupons.read().await.get(&code).unwrap().used_count, 1);
    let (_, orders) = call(&app, Method::GET, "/order", "late", None).await;
    assert!(orders.as_array().unwrap().is_empty());
    let (_, cart) = call(&app, Method::GET, "/cart", "late", None).await;
    assert_eq!(cart["itemCount"], 1);
}

#[tokio::test]
async fn empty_cart_refuses_coupon_and_remembers_why() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/cart/coupon", "s-fresh", Some(json!({ "code": "WELCOME10" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Add items to your cart before applying a coupon");

    let (_, cart) = call(&app, Method::GET, "/cart", "s-fresh", None).await;
    assert!(cart["coupon"].is_null());
    assert_eq!(cart["couponError"], "Add items to your cart before applying a coupon");

    add(&app, "s-fresh", "puma-rs-x", "41", 1).await;
    let (status, cart) = call(&app, Method::POST, "/cart/coupon", "s-fresh", Some(json!({ "code": "WELCOME10" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["coupon"]["code"], "WELCOME10");
    assert!(cart["couponError"].is_null());
}
