//! Demo storefront API: products, cart, coupons, wishlist, orders and chat.

use axum::{routing::{delete, get, patch, post}, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

pub mod chat;
pub mod error;
pub mod events;
pub mod handlers;

pub use chat::{ChatMessage, ChatRelay};
pub use error::{ApiError, ErrorResponse};
pub use events::EventPublisher;

use crate::config::Config;
use crate::domain::services::{BrandAliasTable, CouponRegistry, ProductCatalog};
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub catalog: Arc<RwLock<ProductCatalog>>,
    pub coupons: Arc<RwLock<CouponRegistry>>,
    pub aliases: Arc<BrandAliasTable>,
    pub config: Arc<Config>,
    pub chat: ChatRelay,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, aliases: BrandAliasTable, nats: Option<async_nats::Client>) -> Self {
        Self {
            store,
            catalog: Arc::new(RwLock::new(ProductCatalog::seeded())),
            coupons: Arc::new(RwLock::new(CouponRegistry::seeded())),
            aliases: Arc::new(aliases),
            chat: ChatRelay::new(config.chat_capacity, nats.clone()),
            events: EventPublisher::new(nats),
            config: Arc::new(config),
        }
    }

    /// Seeded catalog and coupons over an in-memory store, no NATS.
    pub fn in_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), BrandAliasTable::default(), None)
    }

    /// Wires optional collaborators from configuration: Postgres when
    /// `DATABASE_URL` is set, NATS when `NATS_URL` is set and reachable.
    pub async fn from_config(config: Config) -> crate::Result<Self> {
        let aliases = match &config.brand_aliases_path {
            Some(path) => BrandAliasTable::load(path)?,
            None => BrandAliasTable::default(),
        };
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => Arc::new(PgStore::connect(url).await?),
            None => {
                info!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        let nats = match &config.nats_url {
            Some(url) => match async_nats::connect(url.as_str()).await {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "NATS unavailable, events stay local");
                    None
                }
            },
            None => None,
        };
        Ok(Self::new(config, store, aliases, nats))
    }
}

pub fn router(state: AppState) -> Router {
    let timeout = state.config.request_timeout;
    Router::new()
        .route("/health", get(handlers::health))
        .route("/product", get(handlers::list_products))
        .route("/product/:id", get(handlers::get_product))
        .route("/cart", get(handlers::get_cart).post(handlers::add_to_cart).delete(handlers::clear_cart))
        .route("/cart/summary", get(handlers::cart_summary))
        .route("/cart/coupon", post(handlers::apply_coupon).delete(handlers::remove_coupon))
        .route("/cart/:line_id", patch(handlers::update_cart_item).delete(handlers::remove_cart_item))
        .route("/coupon", get(handlers::list_coupons))
        .route("/wishlist", get(handlers::get_wishlist).post(handlers::add_to_wishlist))
        .route("/wishlist/:product_id", delete(handlers::remove_from_wishlist))
        .route("/wishlist/:product_id/move-to-cart", post(handlers::move_to_cart))
        .route("/order", get(handlers::list_orders).post(handlers::place_order))
        .route("/order/:id", get(handlers::get_order))
        .route("/order/:id/cancel", post(handlers::cancel_order))
        .route("/chat", get(chat::chat_socket))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
