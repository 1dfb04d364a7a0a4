//! Model roles
use std::io::Write;
use std::time::SystemTime;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Jsonb;
use serde_json;
use validator::Validate;

use models::authorization::ModulePermissions;
use models::RoleId;

use schema::roles;

/// DB presenting by role
#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable)]
#[table_name = "roles"]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub is_active: bool,
    pub permissions: RolePermissions,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Payload for creating role
#[derive(Serialize, Deserialize, Insertable, Clone, Validate, Debug)]
#[table_name = "roles"]
pub struct NewRole {
    #[validate(length(min = "1", max = "64"))]
    pub name: String,
    pub is_active: bool,
    pub permissions: RolePermissions,
}

/// Payload for updating role
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Debug)]
#[table_name = "roles"]
pub struct UpdateRole {
    #[validate(length(min = "1", max = "64"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub permissions: Option<RolePermissions>,
}

/// Permission document of a role, stored as one Jsonb column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Jsonb"]
pub struct RolePermissions(pub Vec<ModulePermissions>);

impl FromSql<Jsonb, Pg> for RolePermissions {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        serde_json::from_value(value).map_err(|e| e.into())
    }
}

impl ToSql<Jsonb, Pg> for RolePermissions {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        let value = serde_json::to_value(self)?;
        <serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(&value, out)
    }
}
