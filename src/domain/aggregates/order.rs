//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::{Cart, CartItem, CartSummary};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{CouponCode, Money};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    order_number: u64,
    session_id: String,
    email: String,
    status: OrderStatus,
    items: Vec<LineItem>,
    summary: CartSummary,
    coupon: Option<CouponCode>,
    shipping_address: Address,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem { pub product_id: String, pub name: String, pub brand: String, pub size: Option<String>, pub color: Option<String>, pub quantity: u32, pub unit_price: Money, pub total: Money }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address { pub full_name: String, pub phone: String, pub street: String, pub city: String, pub province: Option<String>, pub postal_code: Option<String> }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Shipped, Delivered, Cancelled }

impl From<&CartItem> for LineItem {
    fn from(i: &CartItem) -> Self {
        Self {
            product_id: i.product_id.clone(), name: i.name.clone(), brand: i.brand.clone(), size: i.size.clone(),
            color: i.color.clone(), quantity: i.quantity, unit_price: i.unit_price, total: i.line_total(),
        }
    }
}

impl Order {
    /// Captures the cart's lines, totals and coupon. The caller clears the cart.
    pub fn place(order_number: u64, cart: &Cart, summary: CartSummary, email: impl Into<String>, shipping_address: Address) -> Result<Self, OrderError> {
        if cart.is_empty() { return Err(OrderError::NoItems); }
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let coupon = cart.applied_coupon().map(|c| c.code.clone());
        let mut order = Self {
            id: id.clone(), order_number, session_id: cart.id().to_string(), email: email.into(),
            status: OrderStatus::Pending, items: cart.items().iter().map(LineItem::from).collect(), summary,
            coupon: coupon.clone(), shipping_address, notes: None, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(OrderEvent::Placed { order_id: id, total: summary.total, coupon });
        Ok(order)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self { self.notes = Some(notes.into()); self }

    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> u64 { self.order_number }
    pub fn reference(&self) -> String { format!("ORD-{}", self.order_number) }
    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn email(&self) -> &str { &self.email }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn summary(&self) -> &CartSummary { &self.summary }
    pub fn total(&self) -> &Money { &self.summary.total }
    pub fn coupon(&self) -> Option<&CouponCode> { self.coupon.as_ref() }
    pub fn shipping_address(&self) -> &Address { &self.shipping_address }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn confirm(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Pending, OrderStatus::Confirmed)?;
        self.raise_event(OrderEvent::Confirmed { order_id: self.id.clone() });
        Ok(())
    }

    pub fn ship(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Confirmed, OrderStatus::Shipped)?;
        self.raise_event(OrderEvent::Shipped { order_id: self.id.clone() });
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Shipped, OrderStatus::Delivered)?;
        self.raise_event(OrderEvent::Delivered { order_id: self.id.clone() });
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed) {
            return Err(OrderError::CannotCancel(self.status));
        }
        self.status = OrderStatus::Cancelled;
        self.touch();
        self.raise_event(OrderEvent::Cancelled { order_id: self.id.clone() });
        Ok(())
    }

    fn transition(&mut self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if self.status != from { return Err(OrderError::InvalidTransition { from: self.status, to }); }
        self.status = to;
        self.touch();
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(DomainEvent::Order(e)); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("cannot place an order from an empty cart")]
    NoItems,
    #[error("order cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order cannot be cancelled once {0:?}")]
    CannotCancel(OrderStatus),
}
