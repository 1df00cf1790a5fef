//! Aggregates module
pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod wishlist;

pub use cart::{Cart, CartError, CartItem, CartSnapshot, CartSummary, EditState, PendingEdit};
pub use coupon::{Coupon, CouponError, DiscountType};
pub use order::{Address, LineItem, Order, OrderError, OrderStatus};
pub use product::{Product, ProductError, ProductStatus};
pub use wishlist::{Wishlist, WishlistError, WishlistItem};
