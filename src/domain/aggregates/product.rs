//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::aggregates::CartItem;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    name: String,
    brand: String,
    category: String,
    description: String,
    price: Money,
    compare_at_price: Option<Money>,
    sizes: Vec<String>,
    colors: Vec<String>,
    images: Vec<String>,
    stock: u32,
    status: ProductStatus,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus { #[default] Draft, Active, Archived }

impl Product {
    pub fn create(id: impl Into<String>, name: impl Into<String>, brand: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(), name: name.into(), brand: brand.into(), category: String::new(), description: String::new(),
            price, compare_at_price: None, sizes: vec![], colors: vec![], images: vec![], stock: 0,
            status: ProductStatus::Draft, created_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn with_compare_at(mut self, price: Money) -> Self { self.compare_at_price = Some(price); self }
    pub fn with_sizes(mut self, sizes: &[&str]) -> Self { self.sizes = sizes.iter().map(|s| s.to_string()).collect(); self }
    pub fn with_colors(mut self, colors: &[&str]) -> Self { self.colors = colors.iter().map(|s| s.to_string()).collect(); self }
    pub fn with_image(mut self, url: impl Into<String>) -> Self { self.images.push(url.into()); self }
    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = stock; self }
    pub fn created(mut self, at: DateTime<Utc>) -> Self { self.created_at = at; self }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn brand(&self) -> &str { &self.brand }
    pub fn category(&self) -> &str { &self.category }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> &Money { &self.price }
    pub fn compare_at_price(&self) -> Option<&Money> { self.compare_at_price.as_ref() }
    pub fn sizes(&self) -> &[String] { &self.sizes }
    pub fn colors(&self) -> &[String] { &self.colors }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn stock(&self) -> u32 { self.stock }
    pub fn status(&self) -> ProductStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn is_active(&self) -> bool { self.status == ProductStatus::Active }
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }

    pub fn publish(mut self) -> Result<Self, ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        self.status = ProductStatus::Active;
        Ok(self)
    }

    pub fn archive(&mut self) { self.status = ProductStatus::Archived; }

    pub fn remove_inventory(&mut self, qty: u32) -> Result<(), ProductError> {
        self.stock = self.stock.checked_sub(qty).ok_or(ProductError::InsufficientInventory { available: self.stock })?;
        Ok(())
    }

    /// Builds a cart line for the chosen variant, checking that the size and
    /// color exist and that enough pairs are in stock.
    pub fn to_cart_item(&self, size: Option<&str>, color: Option<&str>, quantity: u32) -> Result<CartItem, ProductError> {
        if !self.is_active() { return Err(ProductError::Unavailable); }
        if let Some(size) = size {
            if !self.sizes.iter().any(|s| s == size) { return Err(ProductError::UnknownSize(size.to_string())); }
        }
        if let Some(color) = color {
            if !self.colors.iter().any(|c| c.eq_ignore_ascii_case(color)) { return Err(ProductError::UnknownColor(color.to_string())); }
        }
        if quantity > self.stock { return Err(ProductError::InsufficientInventory { available: self.stock }); }

        let mut item = CartItem::new(&self.id, &self.name, &self.brand, self.price, quantity);
        item.size = size.map(str::to_string);
        item.color = color.map(str::to_string);
        item.image = self.images.first().cloned();
        Ok(item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product name is missing")]
    MissingName,
    #[error("product is not available")]
    Unavailable,
    #[error("size {0} is not offered")]
    UnknownSize(String),
    #[error("color {0} is not offered")]
    UnknownColor(String),
    #[error("only {available} pairs left in stock")]
    InsufficientInventory { available: u32 },
}
