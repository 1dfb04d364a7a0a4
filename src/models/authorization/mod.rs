//! Models for working with authorization (acl - access control list)

pub mod action;
pub mod permission;
pub mod resource;

pub use self::action::Action;
pub use self::permission::ModulePermissions;
pub use self::resource::Resource;
