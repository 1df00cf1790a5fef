//! Persistence for carts, wishlists and orders.
//!
//! The demo server runs on [`MemoryStore`]; setting `DATABASE_URL` switches
//! to [`PgStore`].

use async_trait::async_trait;
use thiserror::Error;
use crate::domain::aggregates::{CartSnapshot, Order, WishlistItem};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn load_cart(&self, session_id: &str) -> Result<Option<CartSnapshot>, StoreError>;
    async fn save_cart(&self, cart: &CartSnapshot) -> Result<(), StoreError>;

    async fn load_wishlist(&self, session_id: &str) -> Result<Vec<WishlistItem>, StoreError>;
    async fn save_wishlist(&self, session_id: &str, items: &[WishlistItem]) -> Result<(), StoreError>;

    async fn next_order_number(&self) -> Result<u64, StoreError>;
    /// Inserts or replaces the order with the same id.
    async fn save_order(&self, order: &Order) -> Result<(), StoreError>;
    async fn find_order(&self, id: &str) -> Result<Option<Order>, StoreError>;
    /// Newest first.
    async fn list_orders(&self, session_id: &str) -> Result<Vec<Order>, StoreError>;
}
