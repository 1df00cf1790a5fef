//! Coupon application: validates a shopper-entered code against the cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use crate::domain::aggregates::{Coupon, CouponError};
use crate::domain::services::brands::BrandAliasTable;
use crate::domain::services::discount::PricedItem;
use crate::domain::services::registry::CouponRegistry;
use crate::domain::value_objects::{Currency, Money};

pub struct CouponService<'a> {
    registry: &'a CouponRegistry,
    aliases: &'a BrandAliasTable,
    currency: Currency,
}

impl<'a> CouponService<'a> {
    pub fn new(registry: &'a CouponRegistry, aliases: &'a BrandAliasTable, currency: Currency) -> Self {
        Self { registry, aliases, currency }
    }

    pub fn aliases(&self) -> &BrandAliasTable { self.aliases }

    /// Checks run in order and the first failure wins: existence and active
    /// flag, expiry, minimum spend, brand category, usage limit.
    pub fn validate<I: PricedItem>(&self, raw_code: &str, cart_total: Decimal, items: &[I], now: DateTime<Utc>) -> Result<Coupon, CouponError> {
        let coupon = self.registry.find(raw_code).filter(|c| c.is_active).ok_or(CouponError::InvalidCode)?;
        if coupon.is_expired(now) {
            return Err(CouponError::Expired);
        }
        if cart_total < coupon.min_spend {
            debug!(code = %coupon.code, %cart_total, min_spend = %coupon.min_spend, "cart below minimum spend");
            return Err(CouponError::BelowMinimumSpend { min_spend: Money::new(coupon.min_spend, self.currency) });
        }
        if let Some(category) = coupon.category.as_deref() {
            if !items.iter().any(|i| self.aliases.matches(i.brand(), category)) {
                return Err(CouponError::WrongCategory { category: category.to_string() });
            }
        }
        if coupon.is_exhausted() {
            return Err(CouponError::UsageExhausted);
        }
        Ok(coupon.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Item(&'static str, i64);
    impl PricedItem for Item {
        fn brand(&self) -> &str { self.0 }
        fn unit_price(&self) -> Decimal { Decimal::from(self.1) }
        fn quantity(&self) -> u32 { 1 }
    }

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap() }

    fn check(code: &str, total: i64, items: &[Item]) -> Result<Coupon, CouponError> {
        let registry = CouponRegistry::seeded();
        let aliases = BrandAliasTable::default();
        CouponService::new(&registry, &aliases, Currency::Npr).validate(code, Decimal::from(total), items, now())
    }

    #[test]
    fn unknown_and_inactive_codes_are_invalid() {
        assert_eq!(check("BOGUS", 10_000, &[]), Err(CouponError::InvalidCode));
        assert_eq!(check("SUMMER30", 10_000, &[]), Err(CouponError::InvalidCode));
    }

    #[test]
    fn expired_code_is_rejected() {
        assert_eq!(check("newyear20", 10_000, &[]), Err(CouponError::Expired));
    }

    #[test]
    fn minimum_spend_message_uses_formatted_amount() {
        let err = check("DASHAIN50", 4000, &[Item("Nike", 4000)]).unwrap_err();
        assert_eq!(err.to_string(), "Minimum spend of रु5,000 required");
    }

    #[test]
    fn category_requires_a_matching_brand() {
        let err = check("FESTIVAL15", 3500, &[Item("Nike", 3500)]).unwrap_err();
        assert_eq!(err, CouponError::WrongCategory { category: "Puma".into() });
        let coupon = check("festival15", 3500, &[Item("Puma", 3500)]).unwrap();
        assert_eq!(coupon.code.as_str(), "FESTIVAL15");
    }

    #[test]
    fn usage_limit_is_checked_last() {
        assert_eq!(check("FLASH25", 100, &[]), Err(CouponError::UsageExhausted));
    }

    #[test]
    fn expiry_beats_minimum_spend() {
        assert_eq!(check("NEWYEAR20", 10, &[]), Err(CouponError::Expired));
    }
}
