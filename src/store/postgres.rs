//! PostgreSQL store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use super::{Store, StoreError};
use crate::domain::aggregates::{CartItem, CartSnapshot, Order, WishlistItem};
use crate::domain::value_objects::{CouponCode, Currency, Money};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: String,
    product_id: String,
    name: String,
    brand: String,
    size: Option<String>,
    color: Option<String>,
    image: Option<String>,
    unit_price: Decimal,
    currency: String,
    quantity: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    product_id: String,
    name: String,
    brand: String,
    price: Decimal,
    currency: String,
    image: Option<String>,
    added_at: DateTime<Utc>,
}

fn money(amount: Decimal, currency: &str) -> Result<Money, StoreError> {
    let currency: Currency = currency.parse().map_err(|_| StoreError::Corrupt(format!("unknown currency {currency}")))?;
    Ok(Money::new(amount, currency))
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = StoreError;
    fn try_from(r: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity).map_err(|_| StoreError::Corrupt(format!("cart item {} has quantity {}", r.id, r.quantity)))?;
        Ok(CartItem {
            unit_price: money(r.unit_price, &r.currency)?, id: r.id, product_id: r.product_id, name: r.name,
            brand: r.brand, size: r.size, color: r.color, image: r.image, quantity,
        })
    }
}

impl TryFrom<WishlistRow> for WishlistItem {
    type Error = StoreError;
    fn try_from(r: WishlistRow) -> Result<Self, Self::Error> {
        Ok(WishlistItem {
            price: money(r.price, &r.currency)?, product_id: r.product_id, name: r.name, brand: r.brand,
            image: r.image, added_at: r.added_at,
        })
    }
}

fn status_label(order: &Order) -> String { format!("{:?}", order.status()).to_lowercase() }

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Connects and applies the embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("postgres store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn load_cart(&self, session_id: &str) -> Result<Option<CartSnapshot>, StoreError> {
        let Some((coupon_code, coupon_error, updated_at)) = sqlx::query_as::<_, (Option<String>, Option<String>, DateTime<Utc>)>("SELECT coupon_code, coupon_error, updated_at FROM carts WHERE session_id = $1")
            .bind(session_id).fetch_optional(&self.pool).await? else { return Ok(None) };
        let rows = sqlx::query_as::<_, CartItemRow>("SELECT id, product_id, name, brand, size, color, image, unit_price, currency, quantity FROM cart_items WHERE session_id = $1 ORDER BY position")
            .bind(session_id).fetch_all(&self.pool).await?;
        Ok(Some(CartSnapshot {
            session_id: session_id.to_string(),
            items: rows.into_iter().map(CartItem::try_from).collect::<Result<_, _>>()?,
            coupon_code: coupon_code.and_then(|c| CouponCode::new(c).ok()),
            coupon_error,
            updated_at,
        }))
    }

    async fn save_cart(&self, cart: &CartSnapshot) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO carts (session_id, coupon_code, coupon_error, updated_at) VALUES ($1, $2, $3, $4) ON CONFLICT (session_id) DO UPDATE SET coupon_code = EXCLUDED.coupon_code, coupon_error = EXCLUDED.coupon_error, updated_at = EXCLUDED.updated_at")
            .bind(&cart.session_id).bind(cart.coupon_code.as_ref().map(CouponCode::as_str)).bind(&cart.coupon_error).bind(cart.updated_at)
            .execute(&mut *tx).await?;
        sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(&cart.session_id).execute(&mut *tx).await?;
        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query("INSERT INTO cart_items (id, session_id, position, product_id, name, brand, size, color, image, unit_price, currency, quantity) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
                .bind(&item.id).bind(&cart.session_id).bind(position as i32).bind(&item.product_id).bind(&item.name).bind(&item.brand)
                .bind(&item.size).bind(&item.color).bind(&item.image).bind(item.unit_price.amount()).bind(item.unit_price.currency().code())
                .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_wishlist(&self, session_id: &str) -> Result<Vec<WishlistItem>, StoreError> {
        let rows = sqlx::query_as::<_, WishlistRow>("SELECT product_id, name, brand, price, currency, image, added_at FROM wishlist_items WHERE session_id = $1 ORDER BY position")
            .bind(session_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(WishlistItem::try_from).collect()
    }

    async fn save_wishlist(&self, session_id: &str, items: &[WishlistItem]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM wishlist_items WHERE session_id = $1").bind(session_id).execute(&mut *tx).await?;
        for (position, item) in items.iter().enumerate() {
            sqlx::query("INSERT INTO wishlist_items (session_id, product_id, position, name, brand, price, currency, image, added_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)")
                .bind(session_id).bind(&item.product_id).bind(position as i32).bind(&item.name).bind(&item.brand)
                .bind(item.price.amount()).bind(item.price.currency().code()).bind(&item.image).bind(item.added_at)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn next_order_number(&self) -> Result<u64, StoreError> {
        let next: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')").fetch_one(&self.pool).await?;
        u64::try_from(next).map_err(|_| StoreError::Corrupt(format!("negative order number {next}")))
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        let body = serde_json::to_value(order)?;
        sqlx::query("INSERT INTO orders (id, order_number, session_id, status, total, body, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, body = EXCLUDED.body, updated_at = NOW()")
            .bind(order.id()).bind(order.order_number() as i64).bind(order.session_id()).bind(status_label(order))
            .bind(order.total().amount()).bind(body).bind(order.created_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn find_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let body: Option<serde_json::Value> = sqlx::query_scalar("SELECT body FROM orders WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(body.map(serde_json::from_value).transpose()?)
    }

    async fn list_orders(&self, session_id: &str) -> Result<Vec<Order>, StoreError> {
        let bodies: Vec<serde_json::Value> = sqlx::query_scalar("SELECT body FROM orders WHERE session_id = $1 ORDER BY created_at DESC, order_number DESC")
            .bind(session_id).fetch_all(&self.pool).await?;
        Ok(bodies.into_iter().map(serde_json::from_value).collect::<Result<_, _>>()?)
    }
}
