use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use validator::ValidationError;

use models::{CouponCode, DiscountSpec};

pub fn validate_coupon_code(code: &CouponCode) -> Result<(), ValidationError> {
    lazy_static! {
        static ref COUPON_CODE_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{4,20}$").unwrap();
    }

    if COUPON_CODE_RE.is_match(&code.0) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("code"),
            message: Some(Cow::from("Coupon code must be 4-20 alphanumeric characters")),
            params: HashMap::new(),
        })
    }
}

pub fn validate_discount_spec(discount: &DiscountSpec) -> Result<(), ValidationError> {
    let valid = match *discount {
        DiscountSpec::Percentage {
            value,
            min_order_amount,
            max_discount_amount,
            max_word_count,
        } => {
            value > 0.0
                && value <= 100.0
                && min_order_amount >= 0.0
                && max_discount_amount.map_or(true, |cap| cap >= 0.0)
                && max_word_count.map_or(true, |count| count > 0)
        }
        DiscountSpec::Flat {
            value,
            min_order_amount,
        } => value > 0.0 && min_order_amount >= 0.0,
        DiscountSpec::ProductSpecific { value, .. } => value > 0.0 && value <= 100.0,
        DiscountSpec::QuantityBased {
            value,
            min_quantity,
            max_discount_amount,
        } => {
            value > 0.0
                && value <= 100.0
                && min_quantity >= 1
                && max_discount_amount.map_or(true, |cap| cap >= 0.0)
        }
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("discount"),
            message: Some(Cow::from("Discount values are out of range")),
            params: HashMap::new(),
        })
    }
}
