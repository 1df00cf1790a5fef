//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::value_objects::{CouponCode, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` percent off the cart total, capped at `max_discount`.
    Percentage,
    /// Flat `value` off.
    Fixed,
    /// Buy two eligible items, the cheaper one is free.
    #[serde(rename = "b2g1", alias = "buy2get1")]
    BuyTwoGetOne,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: CouponCode,
    #[serde(default)]
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_spend: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    /// Brand the coupon is restricted to, if any.
    #[serde(default)]
    pub category: Option<String>,
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    pub is_active: bool,
}

impl Coupon {
    pub fn new(code: CouponCode, discount_type: DiscountType, discount_value: Decimal, valid_until: DateTime<Utc>) -> Self {
        Self {
            code, description: String::new(), discount_type, discount_value,
            min_spend: Decimal::ZERO, max_discount: None, category: None, valid_until,
            usage_limit: None, used_count: 0, is_active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn with_min_spend(mut self, min_spend: impl Into<Decimal>) -> Self { self.min_spend = min_spend.into(); self }
    pub fn with_max_discount(mut self, cap: impl Into<Decimal>) -> Self { self.max_discount = Some(cap.into()); self }
    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = Some(category.into()); self }
    pub fn with_usage_limit(mut self, limit: u32) -> Self { self.usage_limit = Some(limit); self }
    pub fn with_used_count(mut self, used: u32) -> Self { self.used_count = used; self }
    pub fn inactive(mut self) -> Self { self.is_active = false; self }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now > self.valid_until }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }

    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit.map(|limit| limit.saturating_sub(self.used_count))
    }

    pub fn record_redemption(&mut self) -> Result<(), CouponError> {
        if self.is_exhausted() { return Err(CouponError::UsageExhausted); }
        self.used_count += 1;
        Ok(())
    }
}

/// Reasons a code cannot be applied. The display text is shown to shoppers
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Invalid coupon code")]
    InvalidCode,
    #[error("This coupon has expired")]
    Expired,
    #[error("Minimum spend of {min_spend} required")]
    BelowMinimumSpend { min_spend: Money },
    #[error("This coupon is only valid for {category} products")]
    WrongCategory { category: String },
    #[error("This coupon has reached its usage limit")]
    UsageExhausted,
    #[error("Add items to your cart before applying a coupon")]
    EmptyCart,
}
