//! Enum for resources available in ACLs
//!
//! Each variant maps to the module key used in stored role
//! permission documents.
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resource {
    Coupons,
    CouponUsages,
    Roles,
    Users,
    Tickets,
}

impl Resource {
    /// Module key as written in role permission documents
    pub fn as_module(&self) -> &'static str {
        match *self {
            Resource::Coupons => "coupons",
            Resource::CouponUsages => "coupon_usages",
            Resource::Roles => "roles",
            Resource::Users => "users",
            Resource::Tickets => "tickets",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_module())
    }
}
