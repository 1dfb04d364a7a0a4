//! Model coupons
use std::io::Write;
use std::time::SystemTime;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Jsonb;
use serde_json;
use validator::Validate;

use models::validation_rules::*;
use models::{CouponCode, CouponId, ProductId};

use schema::coupons;

/// DB presenting by coupon
#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable)]
#[table_name = "coupons"]
pub struct Coupon {
    pub id: CouponId,
    pub code: CouponCode,
    pub title: String,
    pub discount: DiscountSpec,
    pub usage_limit_per_user: i32,
    pub total_usage_limit: i32,
    pub used_count: i32,
    pub is_active: bool,
    pub expires_at: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Coupon {
    /// Length of generated coupon codes
    pub const GENERATED_CODE_LENGTH: usize = 12;

    /// A coupon is expired once `expires_at` lies in the past;
    /// a missing `expires_at` never expires.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < SystemTime::now(),
            None => false,
        }
    }
}

/// Payload for creating coupon
#[derive(Serialize, Deserialize, Insertable, Clone, Validate, Debug)]
#[table_name = "coupons"]
pub struct NewCoupon {
    #[validate(custom = "validate_coupon_code")]
    pub code: CouponCode,
    #[validate(length(min = "1", max = "256"))]
    pub title: String,
    #[validate(custom = "validate_discount_spec")]
    pub discount: DiscountSpec,
    #[validate(range(min = "1", max = "1000000"))]
    pub usage_limit_per_user: i32,
    #[validate(range(min = "1", max = "1000000"))]
    pub total_usage_limit: i32,
    pub expires_at: Option<SystemTime>,
}

/// Payload for updating coupon
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Debug)]
#[table_name = "coupons"]
pub struct UpdateCoupon {
    #[validate(length(min = "1", max = "256"))]
    pub title: Option<String>,
    #[validate(custom = "validate_discount_spec")]
    pub discount: Option<DiscountSpec>,
    #[validate(range(min = "1", max = "1000000"))]
    pub usage_limit_per_user: Option<i32>,
    #[validate(range(min = "1", max = "1000000"))]
    pub total_usage_limit: Option<i32>,
    pub is_active: Option<bool>,
    pub expires_at: Option<SystemTime>,
}

/// Payload for searching a coupon by code
#[derive(Deserialize, Clone, Debug)]
pub struct CouponsSearchCodePayload {
    pub code: CouponCode,
}

/// Discount rules of a coupon. Each variant carries only the fields
/// its calculation needs; `Flat` has no cap field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Jsonb"]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountSpec {
    Percentage {
        value: f64,
        #[serde(default)]
        min_order_amount: f64,
        max_discount_amount: Option<f64>,
        max_word_count: Option<i32>,
    },
    Flat {
        value: f64,
        #[serde(default)]
        min_order_amount: f64,
    },
    ProductSpecific {
        product: ProductId,
        value: f64,
    },
    QuantityBased {
        value: f64,
        #[serde(default = "default_min_quantity")]
        min_quantity: i32,
        max_discount_amount: Option<f64>,
    },
}

fn default_min_quantity() -> i32 {
    1
}

impl FromSql<Jsonb, Pg> for DiscountSpec {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        serde_json::from_value(value).map_err(|e| e.into())
    }
}

impl ToSql<Jsonb, Pg> for DiscountSpec {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        let value = serde_json::to_value(self)?;
        <serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(&value, out)
    }
}
