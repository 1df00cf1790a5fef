//! Static coupon catalog

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use crate::domain::aggregates::{Coupon, CouponError, DiscountType};
use crate::domain::value_objects::CouponCode;

#[derive(Clone, Debug, Default)]
pub struct CouponRegistry {
    coupons: BTreeMap<CouponCode, Coupon>,
}

fn until(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    // an impossible date seeds an already-expired coupon
    Utc.with_ymd_and_hms(year, month, day, 23, 59, 59).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn code(raw: &str) -> Option<CouponCode> { CouponCode::new(raw).ok() }

impl CouponRegistry {
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self { coupons: coupons.into_iter().map(|c| (c.code.clone(), c)).collect() }
    }

    /// Catalog the storefront ships with.
    pub fn seeded() -> Self {
        let seeds = [
            code("DASHAIN50").map(|c| Coupon::new(c, DiscountType::Percentage, Decimal::from(50), until(2027, 10, 31))
                .with_description("Dashain special: 50% off orders above रु5,000")
                .with_min_spend(5000).with_max_discount(3000).with_usage_limit(500)),
            code("FESTIVAL15").map(|c| Coupon::new(c, DiscountType::Percentage, Decimal::from(15), until(2027, 12, 31))
                .with_description("15% off Puma footwear")
                .with_min_spend(2000).with_max_discount(5000).with_category("Puma").with_usage_limit(1000)),
            code("TIHAR500").map(|c| Coupon::new(c, DiscountType::Fixed, Decimal::from(500), until(2027, 11, 15))
                .with_description("रु500 off orders above रु4,000")
                .with_min_spend(4000).with_usage_limit(300)),
            code("NIKEB2G1").map(|c| Coupon::new(c, DiscountType::BuyTwoGetOne, Decimal::ZERO, until(2027, 12, 31))
                .with_description("Buy two Nike pairs, the cheaper one is free")
                .with_category("Nike").with_usage_limit(200)),
            code("ADIDASB2G1").map(|c| Coupon::new(c, DiscountType::BuyTwoGetOne, Decimal::ZERO, until(2027, 12, 31))
                .with_description("Buy two Adidas pairs, the cheaper one is free")
                .with_category("Adidas").with_usage_limit(200)),
            code("WELCOME10").map(|c| Coupon::new(c, DiscountType::Percentage, Decimal::from(10), until(2028, 12, 31))
                .with_description("10% off your first order")
                .with_max_discount(1000)),
            code("NEWYEAR20").map(|c| Coupon::new(c, DiscountType::Percentage, Decimal::from(20), until(2025, 4, 14))
                .with_description("Nepali New Year 2082")
                .with_min_spend(3000).with_max_discount(2000)),
            code("FLASH25").map(|c| Coupon::new(c, DiscountType::Percentage, Decimal::from(25), until(2027, 12, 31))
                .with_description("Flash sale, first 50 shoppers")
                .with_max_discount(1500).with_usage_limit(50).with_used_count(50)),
            code("SUMMER30").map(|c| Coupon::new(c, DiscountType::Percentage, Decimal::from(30), until(2027, 6, 30))
                .with_description("Summer clearance (paused)")
                .with_max_discount(2500).inactive()),
        ];
        Self::new(seeds.into_iter().flatten())
    }

    /// Case-insensitive lookup; malformed codes simply miss.
    pub fn find(&self, raw: &str) -> Option<&Coupon> {
        CouponCode::new(raw).ok().and_then(|code| self.coupons.get(&code))
    }

    pub fn get(&self, code: &CouponCode) -> Option<&Coupon> { self.coupons.get(code) }

    pub fn insert(&mut self, coupon: Coupon) -> Option<Coupon> { self.coupons.insert(coupon.code.clone(), coupon) }

    pub fn iter(&self) -> impl Iterator<Item = &Coupon> { self.coupons.values() }

    pub fn len(&self) -> usize { self.coupons.len() }
    pub fn is_empty(&self) -> bool { self.coupons.is_empty() }

    /// Coupons a shopper could still use at `now`.
    pub fn available(&self, now: DateTime<Utc>) -> Vec<&Coupon> {
        self.coupons.values().filter(|c| c.is_active && !c.is_expired(now) && !c.is_exhausted()).collect()
    }

    /// Checks that `code` could be redeemed right now without counting a use.
    pub fn ensure_redeemable(&self, code: &CouponCode) -> Result<&Coupon, CouponError> {
        let coupon = self.get(code).filter(|c| c.is_active).ok_or(CouponError::InvalidCode)?;
        if coupon.is_exhausted() { return Err(CouponError::UsageExhausted); }
        Ok(coupon)
    }

    pub fn record_redemption(&mut self, code: &CouponCode) -> Result<&Coupon, CouponError> {
        let coupon = self.coupons.get_mut(code).ok_or(CouponError::InvalidCode)?;
        coupon.record_redemption()?;
        Ok(coupon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let registry = CouponRegistry::seeded();
        assert_eq!(registry.find(" dashain50 ").map(|c| c.code.as_str()), Some("DASHAIN50"));
        assert!(registry.find("NOPE").is_none());
        assert!(registry.find("").is_none());
    }

    #[test]
    fn available_skips_inactive_expired_and_exhausted() {
        let registry = CouponRegistry::seeded();
        let now = until(2026, 10, 19);
        let codes: Vec<&str> = registry.available(now).iter().map(|c| c.code.as_str()).collect();
        assert!(codes.contains(&"DASHAIN50"));
        assert!(!codes.contains(&"NEWYEAR20"));
        assert!(!codes.contains(&"FLASH25"));
        assert!(!codes.contains(&"SUMMER30"));
    }

    #[test]
    fn redemption_increments_used_count() {
        let mut registry = CouponRegistry::seeded();
        let code = CouponCode::new("TIHAR500").unwrap();
        assert_eq!(registry.record_redemption(&code).unwrap().used_count, 1);
        assert_eq!(registry.record_redemption(&CouponCode::new("FLASH25").unwrap()), Err(CouponError::UsageExhausted));
        assert_eq!(registry.record_redemption(&CouponCode::new("GHOST").unwrap()), Err(CouponError::InvalidCode));
    }

    #[test]
    fn codes_iterate_in_sorted_order() {
        let registry = CouponRegistry::seeded();
        let codes: Vec<&str> = registry.iter().map(|c| c.code.as_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
        assert_eq!(codes.first(), Some(&"ADIDASB2G1"));
        assert!(registry.get(&CouponCode::new("welcome10").unwrap()).is_some());
    }

    #[test]
    fn redeemable_check_does_not_count_a_use() {
        let registry = CouponRegistry::seeded();
        let code = CouponCode::new("TIHAR500").unwrap();
        assert_eq!(registry.ensure_redeemable(&code).unwrap().used_count, 0);
        assert_eq!(registry.get(&code).unwrap().used_count, 0);
        assert_eq!(registry.ensure_redeemable(&CouponCode::new("FLASH25").unwrap()), Err(CouponError::UsageExhausted));
        assert_eq!(registry.ensure_redeemable(&CouponCode::new("SUMMER30").unwrap()), Err(CouponError::InvalidCode));
    }
}
