//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::aggregates::Product;
use crate::domain::events::{DomainEvent, WishlistEvent};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Default)]
pub struct Wishlist {
    session_id: String,
    items: Vec<WishlistItem>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub price: Money,
    pub image: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl From<&Product> for WishlistItem {
    fn from(p: &Product) -> Self {
        Self {
            product_id: p.id().to_string(), name: p.name().to_string(), brand: p.brand().to_string(),
            price: *p.price(), image: p.images().first().cloned(), added_at: Utc::now(),
        }
    }
}

impl Wishlist {
    pub fn new(session_id: impl Into<String>) -> Self { Self { session_id: session_id.into(), ..Default::default() } }

    pub fn restore(session_id: impl Into<String>, items: Vec<WishlistItem>) -> Self {
        Self { session_id: session_id.into(), items, events: vec![] }
    }

    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn items(&self) -> &[WishlistItem] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn contains(&self, product_id: &str) -> bool { self.items.iter().any(|i| i.product_id == product_id) }

    /// Adding a product that is already saved is a no-op; returns whether
    /// anything changed.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.product_id) { return false; }
        self.events.push(DomainEvent::Wishlist(WishlistEvent::Added { session_id: self.session_id.clone(), product_id: item.product_id.clone() }));
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, product_id: &str) -> Result<WishlistItem, WishlistError> {
        let pos = self.items.iter().position(|i| i.product_id == product_id).ok_or_else(|| WishlistError::NotSaved(product_id.to_string()))?;
        self.events.push(DomainEvent::Wishlist(WishlistEvent::Removed { session_id: self.session_id.clone(), product_id: product_id.to_string() }));
        Ok(self.items.remove(pos))
    }

    /// Returns true when the product ends up saved.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.contains(&item.product_id) {
            let _ = self.remove(&item.product_id);
            false
        } else {
            self.add(item)
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WishlistError {
    #[error("product {0} is not in the wishlist")]
    NotSaved(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> WishlistItem {
        WishlistItem { product_id: id.into(), name: "Old Skool".into(), brand: "Vans".into(), price: Money::npr(6500), image: None, added_at: Utc::now() }
    }

    #[test]
    fn add_is_idempotent() {
        let mut w = Wishlist::new("s1");
        assert!(w.add(item("vans-old-skool")));
        assert!(!w.add(item("vans-old-skool")));
        assert_eq!(w.len(), 1);
        assert_eq!(w.take_events().len(), 1);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut w = Wishlist::new("s1");
        assert!(w.toggle(item("a")));
        assert!(w.contains("a"));
        assert!(!w.toggle(item("a")));
        assert!(w.is_empty());
    }

    #[test]
    fn removing_unknown_product_fails() {
        let mut w = Wishlist::new("s1");
        assert_eq!(w.remove("nope"), Err(WishlistError::NotSaved("nope".into())));
    }
}
