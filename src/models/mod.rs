//! Models contain structures and DTOs
//! that service layer uses

pub mod authorization;
pub mod cart;
pub mod coupon;
pub mod coupon_usage;
pub mod discount;
pub mod role;
pub mod types;
pub mod user;
pub mod validation_rules;

pub use self::authorization::*;
pub use self::cart::*;
pub use self::coupon::*;
pub use self::coupon_usage::*;
pub use self::discount::*;
pub use self::role::*;
pub use self::types::*;
pub use self::user::*;
