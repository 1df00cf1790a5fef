//! Shoe Storefront
//!
//! Demo backend and client for an online shoe shop.
//!
//! ## Features
//! - Product catalog with brand-alias aware search
//! - Shopping cart with coupon engine (percentage, fixed, buy-2-get-1)
//! - Wishlist with move-to-cart
//! - Order placement and cancellation
//! - Live-chat relay over WebSocket
//! - Typed HTTP client with optimistic cart edits

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod session;
pub mod store;

use thiserror::Error;

pub use api::{router, AppState};
pub use client::{ClientError, StorefrontClient};
pub use config::{ClientConfig, Config};
pub use domain::aggregates::{Cart, CartItem, CartSummary, Coupon, CouponError, DiscountType, Order, Product, Wishlist};
pub use domain::services::{calculate_discount, BrandAliasTable, CouponRegistry, CouponService, ProductCatalog};
pub use domain::value_objects::{CouponCode, Currency, Money};
pub use session::SessionContext;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("brand alias error: {0}")]
    BrandAliases(#[from] domain::services::BrandAliasError),
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
