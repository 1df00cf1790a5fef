//! Discount calculation

use rust_decimal::Decimal;
use crate::domain::aggregates::{Coupon, DiscountType};
use crate::domain::services::brands::BrandAliasTable;

/// What pricing needs to know about a cart line.
pub trait PricedItem {
    fn brand(&self) -> &str;
    fn unit_price(&self) -> Decimal;
    fn quantity(&self) -> u32;
}

/// Items whose brand falls under the coupon's category. A coupon without a
/// category makes every item eligible.
pub fn eligible_items<'a, I: PricedItem>(coupon: &Coupon, items: &'a [I], aliases: &BrandAliasTable) -> Vec<&'a I> {
    match coupon.category.as_deref() {
        Some(category) => items.iter().filter(|i| aliases.matches(i.brand(), category)).collect(),
        None => items.iter().collect(),
    }
}

/// Discount granted by `coupon` on a cart worth `cart_total`.
///
/// Fixed discounts are returned as-is even when they exceed the total; the
/// cart floors its grand total at zero instead.
pub fn calculate_discount<I: PricedItem>(coupon: &Coupon, cart_total: Decimal, items: &[I], aliases: &BrandAliasTable) -> Decimal {
    let discount = match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = cart_total * coupon.discount_value / Decimal::ONE_HUNDRED;
            match coupon.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        DiscountType::Fixed => coupon.discount_value,
        DiscountType::BuyTwoGetOne => {
            let eligible = eligible_items(coupon, items, aliases);
            if eligible.len() < 2 {
                Decimal::ZERO
            } else {
                let mut cheapest = eligible[0];
                for &item in &eligible[1..] {
                    if item.unit_price() < cheapest.unit_price() { cheapest = item; }
                }
                cheapest.unit_price()
            }
        }
    };
    discount.max(Decimal::ZERO)
}
