//! Cart Aggregate
//!
//! Holds line items and at most one applied coupon. Subtotal is re-derived on
//! every mutation; discount and grand total are derived on demand through
//! [`Cart::summary`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::{Coupon, CouponError};
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::services::{calculate_discount, BrandAliasTable, CouponRegistry, CouponService, PricedItem};
use crate::domain::value_objects::{CouponCode, Currency, Money};

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    items: Vec<CartItem>,
    applied_coupon: Option<Coupon>,
    coupon_error: Option<String>,
    pending: Vec<PendingEdit>,
    subtotal: Money,
    shipping_fee: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, brand: impl Into<String>, unit_price: Money, quantity: u32) -> Self {
        Self {
            id: Uuid::now_v7().to_string(), product_id: product_id.into(), name: name.into(), brand: brand.into(),
            size: None, color: None, image: None, unit_price, quantity,
        }
    }
    pub fn with_size(mut self, size: impl Into<String>) -> Self { self.size = Some(size.into()); self }
    pub fn with_color(mut self, color: impl Into<String>) -> Self { self.color = Some(color.into()); self }
    pub fn with_image(mut self, image: impl Into<String>) -> Self { self.image = Some(image.into()); self }

    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }

    fn same_variant(&self, other: &CartItem) -> bool {
        self.product_id == other.product_id && self.size == other.size && self.color == other.color
    }
}

impl PricedItem for CartItem {
    fn brand(&self) -> &str { &self.brand }
    fn unit_price(&self) -> Decimal { self.unit_price.amount() }
    fn quantity(&self) -> u32 { self.quantity }
}

/// Totals handed to checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
}

/// Lifecycle of an optimistic quantity edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditState { Optimistic, Confirmed, Reverted }

/// A quantity change shown locally before the server has accepted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEdit {
    pub id: Uuid,
    pub line_id: String,
    pub previous: u32,
    pub requested: u32,
}

/// Persistable form of a cart: the coupon is kept by code only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub session_id: String,
    pub items: Vec<CartItem>,
    pub coupon_code: Option<CouponCode>,
    #[serde(default)]
    pub coupon_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(id: impl Into<String>, shipping_fee: Money) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(), items: vec![], applied_coupon: None, coupon_error: None, pending: vec![],
            subtotal: Money::zero(shipping_fee.currency()), shipping_fee, created_at: now, updated_at: now, events: vec![],
        }
    }

    /// Rebuilds a cart from storage. A coupon code that no longer exists in
    /// the registry is dropped.
    pub fn restore(snapshot: CartSnapshot, registry: &CouponRegistry, shipping_fee: Money) -> Self {
        let mut cart = Self::new(snapshot.session_id, shipping_fee);
        cart.items = snapshot.items;
        cart.applied_coupon = snapshot.coupon_code.and_then(|code| registry.get(&code).cloned());
        cart.coupon_error = snapshot.coupon_error;
        cart.subtotal = cart.compute_subtotal();
        cart.updated_at = snapshot.updated_at;
        cart
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            session_id: self.id.clone(), items: self.items.clone(),
            coupon_code: self.applied_coupon.as_ref().map(|c| c.code.clone()),
            coupon_error: self.coupon_error.clone(), updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item(&self, line_id: &str) -> Option<&CartItem> { self.items.iter().find(|i| i.id == line_id) }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn currency(&self) -> Currency { self.shipping_fee.currency() }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn applied_coupon(&self) -> Option<&Coupon> { self.applied_coupon.as_ref() }
    pub fn coupon_error(&self) -> Option<&str> { self.coupon_error.as_deref() }
    pub fn pending_edits(&self) -> &[PendingEdit] { &self.pending }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Adds a line, merging into an existing line of the same product, size
    /// and color. Returns the id of the line that now holds the item.
    pub fn add_item(&mut self, item: CartItem) -> Result<String, CartError> {
        if item.quantity == 0 { return Err(CartError::InvalidQuantity); }
        if item.unit_price.currency() != self.currency() { return Err(CartError::CurrencyMismatch); }
        let (product_id, quantity) = (item.product_id.clone(), item.quantity);
        let line_id = match self.items.iter_mut().find(|i| i.same_variant(&item)) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
                existing.id.clone()
            }
            None => {
                let id = item.id.clone();
                self.items.push(item);
                id
            }
        };
        self.raise_event(CartEvent::ItemAdded { cart_id: self.id.clone(), product_id, quantity });
        self.recalculate();
        Ok(line_id)
    }

    pub fn update_quantity(&mut self, line_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        let item = self.items.iter_mut().find(|i| i.id == line_id).ok_or_else(|| CartError::ItemNotFound(line_id.to_string()))?;
        item.quantity = quantity;
        self.raise_event(CartEvent::QuantityChanged { cart_id: self.id.clone(), line_id: line_id.to_string(), quantity });
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, line_id: &str) -> Result<CartItem, CartError> {
        let pos = self.items.iter().position(|i| i.id == line_id).ok_or_else(|| CartError::ItemNotFound(line_id.to_string()))?;
        let removed = self.items.remove(pos);
        self.pending.retain(|e| e.line_id != line_id);
        self.raise_event(CartEvent::ItemRemoved { cart_id: self.id.clone(), line_id: line_id.to_string() });
        self.recalculate();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.pending.clear();
        self.raise_event(CartEvent::Cleared { cart_id: self.id.clone() });
        self.recalculate();
    }

    /// Server copy wins: local lines are overwritten wholesale. Pending edits
    /// on lines that disappeared are dropped.
    pub fn replace_items(&mut self, items: Vec<CartItem>) {
        self.items = items;
        let items = &self.items;
        self.pending.retain(|e| items.iter().any(|i| i.id == e.line_id));
        self.recalculate();
    }

    /// Validates `raw_code` against the current subtotal and lines. On
    /// failure the error text is kept for display and any previously
    /// applied coupon stays in place. An empty cart takes no coupon.
    pub fn apply_coupon(&mut self, service: &CouponService<'_>, raw_code: &str, now: DateTime<Utc>) -> Result<&Coupon, CouponError> {
        let result = if self.is_empty() {
            Err(CouponError::EmptyCart)
        } else {
            service.validate(raw_code, self.subtotal.amount(), &self.items, now)
        };
        match result {
            Ok(coupon) => {
                self.coupon_error = None;
                self.raise_event(CartEvent::CouponApplied { cart_id: self.id.clone(), code: coupon.code.clone() });
                self.touch();
                Ok(&*self.applied_coupon.insert(coupon))
            }
            Err(err) => {
                self.coupon_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.coupon_error = None;
        let removed = self.applied_coupon.take();
        if let Some(coupon) = &removed {
            self.raise_event(CartEvent::CouponRemoved { cart_id: self.id.clone(), code: coupon.code.clone() });
            self.touch();
        }
        removed
    }

    pub fn discount(&self, aliases: &BrandAliasTable) -> Money {
        let amount = self.applied_coupon.as_ref()
            .map(|c| calculate_discount(c, self.subtotal.amount(), &self.items, aliases))
            .unwrap_or(Decimal::ZERO);
        Money::new(amount, self.currency())
    }

    /// subtotal + shipping − discount, floored at zero. Shipping is only
    /// charged on a non-empty cart.
    pub fn summary(&self, aliases: &BrandAliasTable) -> CartSummary {
        let currency = self.currency();
        let shipping = if self.is_empty() { Money::zero(currency) } else { self.shipping_fee };
        let discount = self.discount(aliases);
        let gross = Money::new(self.subtotal.amount() + shipping.amount(), currency);
        let total = gross.saturating_sub(&discount).unwrap_or(gross);
        CartSummary { subtotal: self.subtotal, shipping, discount, total }
    }

    /// Applies a quantity change locally before the server confirms it.
    pub fn begin_quantity_edit(&mut self, line_id: &str, quantity: u32) -> Result<PendingEdit, CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        let item = self.items.iter_mut().find(|i| i.id == line_id).ok_or_else(|| CartError::ItemNotFound(line_id.to_string()))?;
        let edit = PendingEdit { id: Uuid::now_v7(), line_id: line_id.to_string(), previous: item.quantity, requested: quantity };
        item.quantity = quantity;
        self.pending.push(edit.clone());
        self.recalculate();
        Ok(edit)
    }

    pub fn confirm_edit(&mut self, edit_id: Uuid) -> Result<EditState, CartError> {
        let pos = self.pending.iter().position(|e| e.id == edit_id).ok_or(CartError::EditNotFound(edit_id))?;
        self.pending.remove(pos);
        Ok(EditState::Confirmed)
    }

    /// Rolls back an optimistic edit. When a newer edit on the same line is
    /// still in flight, the newer quantity stays visible and inherits this
    /// edit's baseline instead.
    pub fn revert_edit(&mut self, edit_id: Uuid) -> Result<EditState, CartError> {
        let pos = self.pending.iter().position(|e| e.id == edit_id).ok_or(CartError::EditNotFound(edit_id))?;
        let edit = self.pending.remove(pos);
        if let Some(newer) = self.pending[pos..].iter_mut().find(|e| e.line_id == edit.line_id) {
            newer.previous = edit.previous;
        } else if let Some(item) = self.items.iter_mut().find(|i| i.id == edit.line_id) {
            item.quantity = edit.previous;
            self.recalculate();
        }
        Ok(EditState::Reverted)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(DomainEvent::Cart(e)); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }

    fn compute_subtotal(&self) -> Money {
        self.items.iter().fold(Money::zero(self.currency()), |acc, i| acc.add(&i.line_total()).unwrap_or(acc))
    }

    fn recalculate(&mut self) {
        self.subtotal = self.compute_subtotal();
        if self.items.is_empty() && self.applied_coupon.is_some() {
            self.remove_coupon();
        }
        self.touch();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart item {0} not found")]
    ItemNotFound(String),
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("item priced in a different currency than the cart")]
    CurrencyMismatch,
    #[error("no pending edit {0}")]
    EditNotFound(Uuid),
}
