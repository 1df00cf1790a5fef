//! HTTP error mapping

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use crate::domain::aggregates::{CartError, CouponError, OrderError, ProductError, WishlistError};
use crate::store::StoreError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Canonical status text, e.g. "Unprocessable Entity".
    pub error: String,
    /// Human-readable message, shown to shoppers for coupon failures.
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Coupon(#[from] CouponError),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Wishlist(#[from] WishlistError),
    #[error("invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Coupon(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Cart(CartError::ItemNotFound(_)) | Self::Cart(CartError::EditNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Cart(_) => StatusCode::BAD_REQUEST,
            Self::Product(ProductError::InsufficientInventory { .. }) | Self::Product(ProductError::Unavailable) => StatusCode::CONFLICT,
            Self::Product(_) => StatusCode::BAD_REQUEST,
            Self::Order(OrderError::NoItems) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Order(_) => StatusCode::CONFLICT,
            Self::Wishlist(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, "store failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse { error: status.canonical_reason().unwrap_or("Error").to_string(), message };
        (status, Json(body)).into_response()
    }
}
