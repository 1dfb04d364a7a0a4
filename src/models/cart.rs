//! Transient cart snapshot supplied by the checkout caller
//!
//! The snapshot is a read-only view: totals come from the caller and
//! are never re-derived here.

use models::{CouponCode, ProductId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub products: Vec<CartProduct>,
    pub total_price: f64,
    pub total_quantity: i32,
}

/// One cart line. `word_count` only matters to coupons carrying a
/// word-count qualifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProduct {
    pub product: ProductId,
    pub quantity: i32,
    pub word_count: Option<i32>,
    pub total_price: f64,
}

/// Payload for applying or previewing a coupon against a cart
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyCouponPayload {
    pub code: Option<CouponCode>,
    pub cart: CartSnapshot,
}
