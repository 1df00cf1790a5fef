//! In-process store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use super::{Store, StoreError};
use crate::domain::aggregates::{CartSnapshot, Order, WishlistItem};

const FIRST_ORDER_NUMBER: u64 = 1001;

#[derive(Debug)]
pub struct MemoryStore {
    carts: RwLock<HashMap<String, CartSnapshot>>,
    wishlists: RwLock<HashMap<String, Vec<WishlistItem>>>,
    orders: RwLock<Vec<Order>>,
    order_seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            carts: RwLock::default(),
            wishlists: RwLock::default(),
            orders: RwLock::default(),
            order_seq: AtomicU64::new(FIRST_ORDER_NUMBER),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_cart(&self, session_id: &str) -> Result<Option<CartSnapshot>, StoreError> {
        Ok(self.carts.read().await.get(session_id).cloned())
    }

    async fn save_cart(&self, cart: &CartSnapshot) -> Result<(), StoreError> {
        self.carts.write().await.insert(cart.session_id.clone(), cart.clone());
        Ok(())
    }

    async fn load_wishlist(&self, session_id: &str) -> Result<Vec<WishlistItem>, StoreError> {
        Ok(self.wishlists.read().await.get(session_id).cloned().unwrap_or_default())
    }

    async fn save_wishlist(&self, session_id: &str, items: &[WishlistItem]) -> Result<(), StoreError> {
        self.wishlists.write().await.insert(session_id.to_string(), items.to_vec());
        Ok(())
    }

    async fn next_order_number(&self) -> Result<u64, StoreError> {
        Ok(self.order_seq.fetch_add(1, Ordering::SeqCst))
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|o| o.id() == order.id()) {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        Ok(())
    }

    async fn find_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.iter().find(|o| o.id() == id).cloned())
    }

    async fn list_orders(&self, session_id: &str) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.read().await.iter().filter(|o| o.session_id() == session_id).cloned().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.order_number().cmp(&a.order_number())));
        Ok(orders)
    }
}
