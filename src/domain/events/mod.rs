//! Domain events
use crate::domain::value_objects::{CouponCode, Money};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "lowercase")]
pub enum DomainEvent {
    Cart(CartEvent),
    Wishlist(WishlistEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// NATS subject suffix, e.g. `cart.item_added`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cart(e) => match e {
                CartEvent::ItemAdded { .. } => "cart.item_added",
                CartEvent::QuantityChanged { .. } => "cart.quantity_changed",
                CartEvent::ItemRemoved { .. } => "cart.item_removed",
                CartEvent::Cleared { .. } => "cart.cleared",
                CartEvent::CouponApplied { .. } => "cart.coupon_applied",
                CartEvent::CouponRemoved { .. } => "cart.coupon_removed",
            },
            Self::Wishlist(e) => match e {
                WishlistEvent::Added { .. } => "wishlist.added",
                WishlistEvent::Removed { .. } => "wishlist.removed",
            },
            Self::Order(e) => match e {
                OrderEvent::Placed { .. } => "order.placed",
                OrderEvent::Confirmed { .. } => "order.confirmed",
                OrderEvent::Shipped { .. } => "order.shipped",
                OrderEvent::Delivered { .. } => "order.delivered",
                OrderEvent::Cancelled { .. } => "order.cancelled",
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { cart_id: String, product_id: String, quantity: u32 },
    QuantityChanged { cart_id: String, line_id: String, quantity: u32 },
    ItemRemoved { cart_id: String, line_id: String },
    Cleared { cart_id: String },
    CouponApplied { cart_id: String, code: CouponCode },
    CouponRemoved { cart_id: String, code: CouponCode },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WishlistEvent {
    Added { session_id: String, product_id: String },
    Removed { session_id: String, product_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, total: Money, coupon: Option<CouponCode> },
    Confirmed { order_id: String },
    Shipped { order_id: String },
    Delivered { order_id: String },
    Cancelled { order_id: String },
}
