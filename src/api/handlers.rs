//! REST handlers

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;
use super::{ApiError, AppState};
use std::collections::BTreeMap;
use crate::domain::aggregates::{
    Address, Cart, CartItem, CartSummary, Coupon, DiscountType, Order, OrderError, Product, ProductError, Wishlist, WishlistError, WishlistItem,
};
use crate::domain::services::{CouponService, ProductQuery};
use crate::session::{GUEST_SESSION, SESSION_HEADER};

type ApiResult<T> = Result<T, ApiError>;

/// Session id taken from the `x-session-id` header, `guest` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(SESSION_HEADER) else { return Ok(Session(GUEST_SESSION.to_string())) };
        let id = raw.to_str().map_err(|_| ApiError::BadRequest("session id must be ASCII".into()))?.trim();
        let valid = !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid { return Err(ApiError::BadRequest("malformed session id".into())); }
        Ok(Session(id.to_string()))
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_spend: Decimal,
    pub max_discount: Option<Decimal>,
    pub category: Option<String>,
    pub valid_until: DateTime<Utc>,
}

impl From<&Coupon> for CouponView {
    fn from(c: &Coupon) -> Self {
        Self {
            code: c.code.to_string(), description: c.description.clone(), discount_type: c.discount_type,
            discount_value: c.discount_value, min_spend: c.min_spend, max_discount: c.max_discount,
            category: c.category.clone(), valid_until: c.valid_until,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub session_id: String,
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub coupon: Option<CouponView>,
    pub coupon_error: Option<String>,
    pub summary: CartSummary,
}

fn cart_view(state: &AppState, cart: &Cart) -> CartView {
    CartView {
        session_id: cart.id().to_string(),
        items: cart.items().to_vec(),
        item_count: cart.item_count(),
        coupon: cart.applied_coupon().map(CouponView::from),
        coupon_error: cart.coupon_error().map(str::to_string),
        summary: cart.summary(&state.aliases),
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[validate(length(min = 1, max = 128))]
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, max = 10))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    #[validate(length(min = 1, max = 128))]
    pub product_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MoveToCartRequest {
    pub size: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}

impl From<AddressRequest> for Address {
    fn from(r: AddressRequest) -> Self {
        Address { full_name: r.full_name, phone: r.phone, street: r.street, city: r.city, province: r.province, postal_code: r.postal_code }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[validate(email)]
    pub email: String,
    pub shipping_address: AddressRequest,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Validated quantities are in 1..=10.
fn quantity(value: i64) -> u32 { u32::try_from(value).unwrap_or(1) }

/// Pairs of `product_id` already in the cart across every size and color,
/// not counting line `skip`.
fn reserved(cart: &Cart, product_id: &str, skip: Option<&str>) -> u32 {
    cart.items().iter()
        .filter(|i| i.product_id == product_id && skip != Some(i.id.as_str()))
        .map(|i| i.quantity)
        .sum()
}

// =============================================================================
// Persistence helpers
// =============================================================================

async fn load_cart(state: &AppState, session: &str) -> ApiResult<Cart> {
    let snapshot = state.store.load_cart(session).await?;
    let registry = state.coupons.read().await;
    Ok(match snapshot {
        Some(snapshot) => Cart::restore(snapshot, &registry, state.config.shipping_fee),
        None => Cart::new(session, state.config.shipping_fee),
    })
}

async fn save_cart(state: &AppState, cart: &mut Cart) -> ApiResult<()> {
    state.store.save_cart(&cart.snapshot()).await?;
    state.events.publish(cart.take_events()).await;
    Ok(())
}

async fn load_wishlist(state: &AppState, session: &str) -> ApiResult<Wishlist> {
    Ok(Wishlist::restore(session, state.store.load_wishlist(session).await?))
}

async fn save_wishlist(state: &AppState, wishlist: &mut Wishlist) -> ApiResult<()> {
    state.store.save_wishlist(wishlist.session_id(), wishlist.items()).await?;
    state.events.publish(wishlist.take_events()).await;
    Ok(())
}

async fn find_product(state: &AppState, id: &str) -> ApiResult<Product> {
    state.catalog.read().await.get(id).cloned().ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}

pub async fn health(State(s): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "shoe-storefront", "events": s.events.is_connected()}))
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> ApiResult<Json<Vec<Product>>> {
    let catalog = s.catalog.read().await;
    let hits: Vec<Product> = catalog.search(&q, &s.aliases).into_iter().cloned().collect();
    debug!(results = hits.len(), "product search");
    Ok(Json(hits))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    Ok(Json(find_product(&s, &id).await?))
}

// =============================================================================
// Cart
// =============================================================================

pub async fn get_cart(State(s): State<AppState>, Session(session): Session) -> ApiResult<Json<CartView>> {
    let cart = load_cart(&s, &session).await?;
    Ok(Json(cart_view(&s, &cart)))
}

pub async fn add_to_cart(State(s): State<AppState>, Session(session): Session, Json(r): Json<AddToCartRequest>) -> ApiResult<(StatusCode, Json<CartView>)> {
    r.validate()?;
    let product = find_product(&s, &r.product_id).await?;
    let mut cart = load_cart(&s, &session).await?;
    let already = reserved(&cart, &r.product_id, None);
    let item = product.to_cart_item(r.size.as_deref(), r.color.as_deref(), already + quantity(r.quantity))?;
    let item = CartItem { quantity: quantity(r.quantity), ..item };
    cart.add_item(item)?;
    save_cart(&s, &mut cart).await?;
    Ok((StatusCode::CREATED, Json(cart_view(&s, &cart))))
}

pub async fn update_cart_item(State(s): State<AppState>, Session(session): Session, Path(line_id): Path<String>, Json(r): Json<UpdateQuantityRequest>) -> ApiResult<Json<CartView>> {
    r.validate()?;
    let mut cart = load_cart(&s, &session).await?;
    let line = cart.item(&line_id).cloned().ok_or_else(|| ApiError::NotFound(format!("cart item {line_id} not found")))?;
    if let Some(product) = s.catalog.read().await.get(&line.product_id) {
        if reserved(&cart, &line.product_id, Some(line_id.as_str())) + quantity(r.quantity) > product.stock() {
            return Err(ProductError::InsufficientInventory { available: product.stock() }.into());
        }
    }
    cart.update_quantity(&line_id, quantity(r.quantity))?;
    save_cart(&s, &mut cart).await?;
    Ok(Json(cart_view(&s, &cart)))
}

pub async fn remove_cart_item(State(s): State<AppState>, Session(session): Session, Path(line_id): Path<String>) -> ApiResult<Json<CartView>> {
    let mut cart = load_cart(&s, &session).await?;
    cart.remove_item(&line_id)?;
    save_cart(&s, &mut cart).await?;
    Ok(Json(cart_view(&s, &cart)))
}

pub async fn clear_cart(State(s): State<AppState>, Session(session): Session) -> ApiResult<StatusCode> {
    let mut cart = load_cart(&s, &session).await?;
    cart.clear();
    save_cart(&s, &mut cart).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cart_summary(State(s): State<AppState>, Session(session): Session) -> ApiResult<Json<CartSummary>> {
    let cart = load_cart(&s, &session).await?;
    Ok(Json(cart.summary(&s.aliases)))
}

// =============================================================================
// Coupons
// =============================================================================

pub async fn apply_coupon(State(s): State<AppState>, Session(session): Session, Json(r): Json<ApplyCouponRequest>) -> ApiResult<Json<CartView>> {
    r.validate()?;
    let mut cart = load_cart(&s, &session).await?;
    let mut rejected = None;
    {
        let registry = s.coupons.read().await;
        let service = CouponService::new(&registry, &s.aliases, s.config.currency);
        if let Err(err) = cart.apply_coupon(&service, &r.code, Utc::now()) {
            info!(session = %session, code = %r.code, reason = %err, "coupon rejected");
            rejected = Some(err);
        }
    }
    save_cart(&s, &mut cart).await?;
    if let Some(err) = rejected { return Err(err.into()); }
    Ok(Json(cart_view(&s, &cart)))
}

pub async fn remove_coupon(State(s): State<AppState>, Session(session): Session) -> ApiResult<Json<CartView>> {
    let mut cart = load_cart(&s, &session).await?;
    cart.remove_coupon();
    save_cart(&s, &mut cart).await?;
    Ok(Json(cart_view(&s, &cart)))
}

pub async fn list_coupons(State(s): State<AppState>) -> Json<Vec<CouponView>> {
    let registry = s.coupons.read().await;
    Json(registry.available(Utc::now()).into_iter().map(CouponView::from).collect())
}

// =============================================================================
// Wishlist
// =============================================================================

pub async fn get_wishlist(State(s): State<AppState>, Session(session): Session) -> ApiResult<Json<Vec<WishlistItem>>> {
    Ok(Json(load_wishlist(&s, &session).await?.items().to_vec()))
}

pub async fn add_to_wishlist(State(s): State<AppState>, Session(session): Session, Json(r): Json<WishlistRequest>) -> ApiResult<(StatusCode, Json<Vec<WishlistItem>>)> {
    r.validate()?;
    let product = find_product(&s, &r.product_id).await?;
    let mut wishlist = load_wishlist(&s, &session).await?;
    let status = if wishlist.add(WishlistItem::from(&product)) { StatusCode::CREATED } else { StatusCode::OK };
    save_wishlist(&s, &mut wishlist).await?;
    Ok((status, Json(wishlist.items().to_vec())))
}

pub async fn remove_from_wishlist(State(s): State<AppState>, Session(session): Session, Path(product_id): Path<String>) -> ApiResult<Json<Vec<WishlistItem>>> {
    let mut wishlist = load_wishlist(&s, &session).await?;
    wishlist.remove(&product_id)?;
    save_wishlist(&s, &mut wishlist).await?;
    Ok(Json(wishlist.items().to_vec()))
}

pub async fn move_to_cart(State(s): State<AppState>, Session(session): Session, Path(product_id): Path<String>, Json(r): Json<MoveToCartRequest>) -> ApiResult<Json<CartView>> {
    r.validate()?;
    let mut wishlist = load_wishlist(&s, &session).await?;
    if !wishlist.contains(&product_id) {
        return Err(WishlistError::NotSaved(product_id).into());
    }
    let product = find_product(&s, &product_id).await?;
    let mut cart = load_cart(&s, &session).await?;
    cart.add_item(product.to_cart_item(r.size.as_deref(), r.color.as_deref(), quantity(r.quantity.unwrap_or(1)))?)?;
    wishlist.remove(&product_id)?;
    save_cart(&s, &mut cart).await?;
    save_wishlist(&s, &mut wishlist).await?;
    Ok(Json(cart_view(&s, &cart)))
}

// =============================================================================
// Orders
// =============================================================================

pub async fn list_orders(State(s): State<AppState>, Session(session): Session) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(s.store.list_orders(&session).await?))
}

async fn find_order(s: &AppState, session: &str, id: &str) -> ApiResult<Order> {
    s.store.find_order(id).await?
        .filter(|o| o.session_id() == session)
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}

pub async fn get_order(State(s): State<AppState>, Session(session): Session, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    Ok(Json(find_order(&s, &session, &id).await?))
}

/// Turns the session's cart into an order. Stock and the coupon are checked
/// first; nothing changes unless every check passes and the order is saved.
pub async fn place_order(State(s): State<AppState>, Session(session): Session, Json(r): Json<PlaceOrderRequest>) -> ApiResult<(StatusCode, Json<Order>)> {
    r.validate()?;
    r.shipping_address.validate()?;
    let mut cart = load_cart(&s, &session).await?;
    if cart.is_empty() { return Err(OrderError::NoItems.into()); }

    let mut wanted: BTreeMap<&str, u32> = BTreeMap::new();
    for item in cart.items() {
        *wanted.entry(item.product_id.as_str()).or_default() += item.quantity;
    }

    // catalog before coupons, held until the order is stored
    let mut catalog = s.catalog.write().await;
    let mut coupons = s.coupons.write().await;
    for (&product_id, &qty) in &wanted {
        let product = catalog.get(product_id).ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;
        if !product.is_active() { return Err(ProductError::Unavailable.into()); }
        if product.stock() < qty {
            return Err(ProductError::InsufficientInventory { available: product.stock() }.into());
        }
    }
    if let Some(coupon) = cart.applied_coupon() {
        coupons.ensure_redeemable(&coupon.code)?;
    }

    let summary = cart.summary(&s.aliases);
    let number = s.store.next_order_number().await?;
    let mut order = Order::place(number, &cart, summary, &r.email, r.shipping_address.clone().into())?;
    if let Some(notes) = &r.notes { order = order.with_notes(notes); }
    s.store.save_order(&order).await?;

    if let Some(code) = order.coupon() {
        coupons.record_redemption(code)?;
    }
    for (&product_id, &qty) in &wanted {
        if let Some(product) = catalog.get_mut(product_id) { product.remove_inventory(qty)?; }
    }
    drop(coupons);
    drop(catalog);

    info!(order = %order.reference(), session = %session, total = %order.total(), "order placed");
    cart.clear();
    save_cart(&s, &mut cart).await?;
    s.events.publish(order.take_events()).await;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn cancel_order(State(s): State<AppState>, Session(session): Session, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    let mut order = find_order(&s, &session, &id).await?;
    order.cancel()?;
    s.store.save_order(&order).await?;
    s.events.publish(order.take_events()).await;
    Ok(Json(order))
}
