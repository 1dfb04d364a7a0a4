//! Model users
//!
//! The user directory is written by the identity service; this
//! service reads the fields the permission resolver needs.
use std::time::SystemTime;

use models::{RoleId, UserId};

use schema::users;

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable)]
#[table_name = "users"]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
    pub role_id: Option<RoleId>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}
