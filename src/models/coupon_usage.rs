//! Model coupon_usages

use models::{CouponId, UserId};

use schema::coupon_usages;

/// DB presenting by per-user coupon usage counter
#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable)]
#[table_name = "coupon_usages"]
#[primary_key(coupon_id, user_id)]
pub struct CouponUsage {
    pub coupon_id: CouponId,
    pub user_id: UserId,
    pub usage_count: i32,
}

/// Payload for creating a usage counter
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "coupon_usages"]
pub struct NewCouponUsage {
    pub coupon_id: CouponId,
    pub user_id: UserId,
    pub usage_count: i32,
}
