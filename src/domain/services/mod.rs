//! Domain services
pub mod brands;
pub mod catalog;
pub mod coupons;
pub mod discount;
pub mod registry;

pub use brands::{normalize_brand, BrandAliasError, BrandAliasTable};
pub use catalog::{ProductCatalog, ProductQuery, ProductSort};
pub use coupons::CouponService;
pub use discount::{calculate_discount, eligible_items, PricedItem};
pub use registry::CouponRegistry;
