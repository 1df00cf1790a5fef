//! HTTP client for the storefront API.
//!
//! Keeps a local mirror of the session's cart. Server responses replace the
//! local lines wholesale; quantity edits are shown immediately and rolled
//! back when the server refuses them.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use crate::api::handlers::{CartView, CouponView};
use crate::api::ErrorResponse;
use crate::config::ClientConfig;
use crate::domain::aggregates::{Address, Cart, CartError, CartSummary, Order, Product, WishlistItem};
use crate::session::{SessionContext, SESSION_HEADER};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx answer; `message` is the server's user-facing text.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            Self::Cart(_) => None,
        }
    }
}

pub struct StorefrontClient {
    http: Client,
    base_url: String,
    session: SessionContext,
    cart: Cart,
    view: Option<CartView>,
}

impl StorefrontClient {
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let cart = Cart::new(session.session_id(), config.shipping_fee);
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string(), session, cart, view: None })
    }

    pub fn session(&self) -> &SessionContext { &self.session }
    pub fn session_mut(&mut self) -> &mut SessionContext { &mut self.session }
    pub fn cart(&self) -> &Cart { &self.cart }

    /// Last server-side summary, if the cart has been fetched.
    pub fn summary(&self) -> Option<&CartSummary> { self.view.as_ref().map(|v| &v.summary) }
    pub fn applied_coupon(&self) -> Option<&CouponView> { self.view.as_ref().and_then(|v| v.coupon.as_ref()) }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path)).header(SESSION_HEADER, self.session.session_id());
        match self.session.auth_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };
        Err(ClientError::Api { status, message })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "storefront request failed");
            ClientError::Network(e)
        })?;
        Self::decode(response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(&self, builder: RequestBuilder, body: &B) -> Result<T, ClientError> {
        self.send(builder.json(body)).await
    }

    fn accept(&mut self, view: CartView) -> &CartView {
        self.cart.replace_items(view.items.clone());
        self.cart.take_events();
        &*self.view.insert(view)
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Searches the catalog. Non-blank text queries are remembered in the
    /// session's recent searches.
    pub async fn search_products(&mut self, q: &str, brand: Option<&str>) -> Result<Vec<Product>, ClientError> {
        let mut params = vec![("q", q)];
        if let Some(brand) = brand { params.push(("brand", brand)); }
        let products: Vec<Product> = self.send(self.request(reqwest::Method::GET, "/product").query(&params)).await?;
        self.session.record_search(q);
        debug!(query = q, results = products.len(), "products searched");
        Ok(products)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, ClientError> {
        self.send(self.request(reqwest::Method::GET, &format!("/product/{id}"))).await
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    pub async fn refresh_cart(&mut self) -> Result<&CartView, ClientError> {
        let view = self.send(self.request(reqwest::Method::GET, "/cart")).await?;
        Ok(self.accept(view))
    }

    pub async fn add_to_cart(&mut self, product_id: &str, size: Option<&str>, color: Option<&str>, quantity: u32) -> Result<&CartView, ClientError> {
        let body = json!({ "productId": product_id, "size": size, "color": color, "quantity": quantity });
        let view = self.send_json(self.request(reqwest::Method::POST, "/cart"), &body).await?;
        Ok(self.accept(view))
    }

    /// Shows the new quantity locally right away. If the server rejects the
    /// change or cannot be reached, the line goes back to its last quantity.
    pub async fn update_quantity(&mut self, line_id: &str, quantity: u32) -> Result<&CartView, ClientError> {
        let edit = self.cart.begin_quantity_edit(line_id, quantity)?;
        let result: Result<CartView, ClientError> = self
            .send_json(self.request(reqwest::Method::PATCH, &format!("/cart/{line_id}")), &json!({ "quantity": quantity }))
            .await;
        match result {
            Ok(view) => {
                self.cart.confirm_edit(edit.id)?;
                Ok(self.accept(view))
            }
            Err(err) => {
                warn!(line = line_id, error = %err, "quantity change reverted");
                self.cart.revert_edit(edit.id)?;
                Err(err)
            }
        }
    }

    pub async fn remove_item(&mut self, line_id: &str) -> Result<&CartView, ClientError> {
        let view = self.send(self.request(reqwest::Method::DELETE, &format!("/cart/{line_id}"))).await?;
        Ok(self.accept(view))
    }

    pub async fn clear_cart(&mut self) -> Result<(), ClientError> {
        let response = self.request(reqwest::Method::DELETE, "/cart").send().await?;
        if !response.status().is_success() {
            return Self::decode::<serde_json::Value>(response).await.map(|_| ());
        }
        self.cart.clear();
        self.cart.take_events();
        self.view = None;
        Ok(())
    }

    /// On rejection the error carries the shopper-facing reason, e.g.
    /// "This coupon has expired".
    pub async fn apply_coupon(&mut self, code: &str) -> Result<&CartView, ClientError> {
        let view = self.send_json(self.request(reqwest::Method::POST, "/cart/coupon"), &json!({ "code": code })).await?;
        Ok(self.accept(view))
    }

    pub async fn remove_coupon(&mut self) -> Result<&CartView, ClientError> {
        let view = self.send(self.request(reqwest::Method::DELETE, "/cart/coupon")).await?;
        Ok(self.accept(view))
    }

    pub async fn available_coupons(&self) -> Result<Vec<CouponView>, ClientError> {
        self.send(self.request(reqwest::Method::GET, "/coupon")).await
    }

    // -------------------------------------------------------------------------
    // Wishlist
    // -------------------------------------------------------------------------

    pub async fn wishlist(&self) -> Result<Vec<WishlistItem>, ClientError> {
        self.send(self.request(reqwest::Method::GET, "/wishlist")).await
    }

    pub async fn add_to_wishlist(&self, product_id: &str) -> Result<Vec<WishlistItem>, ClientError> {
        self.send_json(self.request(reqwest::Method::POST, "/wishlist"), &json!({ "productId": product_id })).await
    }

    pub async fn remove_from_wishlist(&self, product_id: &str) -> Result<Vec<WishlistItem>, ClientError> {
        self.send(self.request(reqwest::Method::DELETE, &format!("/wishlist/{product_id}"))).await
    }

    pub async fn move_to_cart(&mut self, product_id: &str, size: Option<&str>) -> Result<&CartView, ClientError> {
        let path = format!("/wishlist/{product_id}/move-to-cart");
        let view = self.send_json(self.request(reqwest::Method::POST, &path), &json!({ "size": size })).await?;
        Ok(self.accept(view))
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn place_order(&mut self, email: &str, address: &Address, notes: Option<&str>) -> Result<Order, ClientError> {
        let body = json!({ "email": email, "shippingAddress": address, "notes": notes });
        let order: Order = self.send_json(self.request(reqwest::Method::POST, "/order"), &body).await?;
        self.cart.clear();
        self.cart.take_events();
        self.view = None;
        Ok(order)
    }

    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        self.send(self.request(reqwest::Method::GET, "/order")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::CartItem;
    use crate::domain::value_objects::Money;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ClientConfig {
        ClientConfig { base_url: server.uri(), timeout: Duration::from_secs(2), shipping_fee: Money::npr(150) }
    }

    fn item(id: &str, quantity: u32) -> CartItem {
        CartItem { id: id.to_string(), ..CartItem::new("nike-air-max-90", "Air Max 90", "Nike", Money::npr(12_000), quantity) }
    }

    fn view(items: Vec<CartItem>) -> serde_json::Value {
        let subtotal: u32 = items.iter().map(|i| i.quantity * 12_000).sum();
        json!({
            "sessionId": "s-1",
            "itemCount": items.iter().map(|i| i.quantity).sum::<u32>(),
            "items": items,
            "coupon": null,
            "couponError": null,
            "summary": {
                "subtotal": Money::npr(subtotal), "shipping": Money::npr(150),
                "discount": Money::npr(0), "total": Money::npr(subtotal + 150)
            }
        })
    }

    #[tokio::test]
    async fn sends_session_header_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/cart"))
            .and(header(SESSION_HEADER, "s-1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(view(vec![item("l1", 2)])))
            .expect(1)
            .mount(&server).await;

        let mut session = SessionContext::new("s-1");
        session.sign_in("tok");
        let mut client = StorefrontClient::new(&config(&server), session).unwrap();
        let view = client.refresh_cart().await.unwrap();
        assert_eq!(view.item_count, 2);
        assert_eq!(client.cart().items().len(), 1);
    }

    #[tokio::test]
    async fn search_records_recent_queries() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/product")).and(query_param("q", "jordan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server).await;

        let mut client = StorefrontClient::new(&config(&server), SessionContext::new("s-1")).unwrap();
        assert!(client.search_products("jordan", None).await.unwrap().is_empty());
        assert_eq!(client.session().recent_searches().collect::<Vec<_>>(), vec!["jordan"]);
    }

    #[tokio::test]
    async fn rejected_coupon_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).and(path("/cart/coupon")).and(body_json(json!({ "code": "NEWYEAR20" })))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": "Unprocessable Entity", "message": "This coupon has expired"
            })))
            .mount(&server).await;

        let mut client = StorefrontClient::new(&config(&server), SessionContext::new("s-1")).unwrap();
        let err = client.apply_coupon("NEWYEAR20").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(err.to_string(), "This coupon has expired");
    }

    #[tokio::test]
    async fn quantity_edit_is_confirmed_by_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(view(vec![item("l1", 1)])))
            .mount(&server).await;
        Mock::given(method("PATCH")).and(path("/cart/l1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(view(vec![item("l1", 3)])))
            .mount(&server).await;

        let mut client = StorefrontClient::new(&config(&server), SessionContext::new("s-1")).unwrap();
        client.refresh_cart().await.unwrap();
        client.update_quantity("l1", 3).await.unwrap();
        assert_eq!(client.cart().items()[0].quantity, 3);
        assert!(client.cart().pending_edits().is_empty());
    }

    #[tokio::test]
    async fn quantity_edit_is_reverted_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(view(vec![item("l1", 1)])))
            .mount(&server).await;
        Mock::given(method("PATCH")).and(path("/cart/l1"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "Conflict", "message": "only 2 pairs left in stock"
            })))
            .mount(&server).await;

        let mut client = StorefrontClient::new(&config(&server), SessionContext::new("s-1")).unwrap();
        client.refresh_cart().await.unwrap();
        let err = client.update_quantity("l1", 5).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(client.cart().items()[0].quantity, 1);
        assert!(client.cart().pending_edits().is_empty());
    }

    #[tokio::test]
    async fn unknown_line_fails_without_a_request() {
        let server = MockServer::start().await;
        let mut client = StorefrontClient::new(&config(&server), SessionContext::new("s-1")).unwrap();
        assert!(matches!(client.update_quantity("missing", 2).await, Err(ClientError::Cart(CartError::ItemNotFound(_)))));
    }
}
