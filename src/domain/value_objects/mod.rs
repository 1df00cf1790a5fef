//! Value Objects for the storefront

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coupon code value object. Codes compare case-insensitively, so the
/// canonical form is trimmed and uppercased.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub const MAX_LEN: usize = 32;

    pub fn new(value: impl AsRef<str>) -> Result<Self, CouponCodeError> {
        let value = value.as_ref().trim().to_uppercase();
        if value.is_empty() { return Err(CouponCodeError::Empty); }
        if value.chars().count() > Self::MAX_LEN { return Err(CouponCodeError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self { code.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponCodeError {
    #[error("coupon code is empty")]
    Empty,
    #[error("coupon code is too long")]
    TooLong,
}

/// ISO currency the storefront prices in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Npr,
    Inr,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self { Self::Npr => "NPR", Self::Inr => "INR", Self::Usd => "USD" }
    }
    pub fn symbol(&self) -> &'static str {
        match self { Self::Npr => "रु", Self::Inr => "₹", Self::Usd => "$" }
    }
}

impl FromStr for Currency {
    type Err = MoneyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NPR" => Ok(Self::Npr),
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Money value object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: Currency }

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self { Self { amount, currency } }
    pub fn npr(amount: impl Into<Decimal>) -> Self { Self::new(amount.into(), Currency::Npr) }
    pub fn zero(currency: Currency) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> Currency { self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, self.currency))
    }

    /// Subtracts `other`, flooring the result at zero.
    pub fn saturating_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new((self.amount - other.amount).max(Decimal::ZERO), self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero(Currency::default()) } }

/// Renders as symbol plus thousands-grouped amount, e.g. `रु5,000` or `$12.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.amount.round_dp(2);
        let abs = rounded.abs();
        let whole = abs.trunc();
        let cents = ((abs - whole) * Decimal::ONE_HUNDRED).round().to_u32().unwrap_or(0);
        let digits = whole.to_u128().unwrap_or(0).to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 { grouped.push(','); }
            grouped.push(ch);
        }

        if rounded.is_sign_negative() && !rounded.is_zero() { f.write_str("-")?; }
        write!(f, "{}{}", self.currency.symbol(), grouped)?;
        if cents > 0 { write!(f, ".{:02}", cents)?; }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("currency mismatch")]
    CurrencyMismatch,
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
}
