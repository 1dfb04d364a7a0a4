//! Discount calculation results and the composed application response

use models::{CartSnapshot, Coupon, DiscountSpec, ProductId};

/// Raw output of the discount calculator
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountResult {
    pub discount: f64,
    pub discounted_total: f64,
    pub applied_to: Option<ProductId>,
}

/// Per-product share of a discount, reported back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDiscount {
    pub product: ProductId,
    pub discount: f64,
}

/// Response of the apply and preview endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponApplication {
    pub coupon: Option<Coupon>,
    pub original_total: f64,
    pub coupon_discount: f64,
    pub final_price: f64,
    pub applied_to: Option<ProductId>,
    pub product_discounts: Vec<ProductDiscount>,
    pub message: String,
}

/// Amounts are kept unrounded through the calculation and rounded to
/// currency precision only here, at the response boundary.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl CouponApplication {
    pub fn without_coupon(cart: &CartSnapshot) -> Self {
        Self {
            coupon: None,
            original_total: round_currency(cart.total_price),
            coupon_discount: 0.0,
            final_price: round_currency(cart.total_price),
            applied_to: None,
            product_discounts: vec![],
            message: "No coupon applied".to_string(),
        }
    }

    pub fn new(coupon: Coupon, cart: &CartSnapshot, result: DiscountResult) -> Self {
        let message = match (&coupon.discount, result.applied_to) {
            (&DiscountSpec::Percentage { value, .. }, Some(product)) if value >= 100.0 => {
                format!("Coupon {} applied: product {} is free", coupon.code, product)
            }
            _ => format!("Coupon {} applied: -{:.2}", coupon.code, round_currency(result.discount)),
        };

        let product_discounts = result
            .applied_to
            .map(|product| {
                vec![ProductDiscount {
                    product,
                    discount: round_currency(result.discount),
                }]
            }).unwrap_or_default();

        Self {
            coupon: Some(coupon),
            original_total: round_currency(cart.total_price),
            coupon_discount: round_currency(result.discount),
            final_price: round_currency(result.discounted_total),
            applied_to: result.applied_to,
            product_discounts,
            message,
        }
    }
}
