//! Repos is a module responsible for interacting with postgres db

pub mod acl;
pub mod coupon_usages;
pub mod coupons;
pub mod repo_factory;
pub mod roles;
pub mod types;
pub mod users;

pub use self::acl::{ApplicationAcl, RoleGrants, RolesCacheImpl, SystemACL, UnauthorizedAcl};
pub use self::coupon_usages::*;
pub use self::coupons::*;
pub use self::repo_factory::*;
pub use self::roles::*;
pub use self::types::*;
pub use self::users::*;
