//! Roles repo, presents CRUD operations with db for roles
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use errors::Error;
use models::{NewRole, Role, RoleId, UpdateRole};
use repos::acl;
use repos::acl::RolesCacheImpl;
use repos::types::{RepoAcl, RepoResult};
use schema::roles::dsl as Roles;

use models::authorization::*;

/// Roles repository, responsible for handling roles and keeping the
/// permission cache in sync with role mutations
pub struct RolesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl>,
    pub cached_roles: RolesCacheImpl,
}

pub trait RolesRepo {
    /// Creates new role
    fn create(&self, payload: NewRole) -> RepoResult<Role>;

    /// List all roles
    fn list(&self) -> RepoResult<Vec<Role>>;

    /// Get role
    fn get(&self, id_arg: RoleId) -> RepoResult<Option<Role>>;

    /// Update role
    fn update(&self, id_arg: RoleId, payload: UpdateRole) -> RepoResult<Role>;

    /// Delete role
    fn delete(&self, id_arg: RoleId) -> RepoResult<Role>;

    /// Permission document of a role, cached per role id
    fn permissions_for_role(&self, id_arg: RoleId) -> RepoResult<Option<Vec<ModulePermissions>>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> RolesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl>, cached_roles: RolesCacheImpl) -> Self {
        Self {
            db_conn,
            acl,
            cached_roles,
        }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> RolesRepo for RolesRepoImpl<'a, T> {
    /// Creates new role
    fn create(&self, payload: NewRole) -> RepoResult<Role> {
        debug!("Create new role {:?}.", payload);
        acl::check(&*self.acl, Resource::Roles, Action::Create)?;

        let query = diesel::insert_into(Roles::roles).values(&payload);
        query
            .get_result::<Role>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Creates new role: {:?} error occurred", payload)).into())
    }

    /// List all roles
    fn list(&self) -> RepoResult<Vec<Role>> {
        debug!("Find all roles.");
        acl::check(&*self.acl, Resource::Roles, Action::Read)?;

        let query = Roles::roles.order(Roles::id);
        query
            .get_results(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context("List all roles").into())
    }

    /// Get role
    fn get(&self, id_arg: RoleId) -> RepoResult<Option<Role>> {
        debug!("Find in role with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Roles, Action::Read)?;

        let query = Roles::roles.filter(Roles::id.eq(&id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Find role by id: {} error occurred", id_arg)).into())
    }

    /// Update role
    fn update(&self, id_arg: RoleId, payload: UpdateRole) -> RepoResult<Role> {
        debug!("Updating role with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::Roles, Action::Update)?;

        self.cached_roles.remove(id_arg);
        let filtered = Roles::roles.filter(Roles::id.eq(&id_arg));
        let query = diesel::update(filtered).set(&payload);
        query
            .get_result::<Role>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Updates specific role: id: {}, payload: {:?}, error occurred",
                    id_arg, payload
                )).into()
            })
    }

    /// Delete role
    fn delete(&self, id_arg: RoleId) -> RepoResult<Role> {
        debug!("Delete role with id {:?}.", id_arg);
        acl::check(&*self.acl, Resource::Roles, Action::Delete)?;

        self.cached_roles.remove(id_arg);
        let filtered = Roles::roles.filter(Roles::id.eq(&id_arg));
        let query = diesel::delete(filtered);
        query
            .get_result::<Role>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Delete role: {:?} error occurred", id_arg)).into())
    }

    /// Permission document of a role, cached per role id
    fn permissions_for_role(&self, id_arg: RoleId) -> RepoResult<Option<Vec<ModulePermissions>>> {
        debug!("Resolve permissions for role {}.", id_arg);
        if self.cached_roles.contains(id_arg) {
            return Ok(self.cached_roles.get(id_arg));
        }

        let role = self.get(id_arg)?;
        Ok(role.map(|role| {
            let permissions = role.permissions.0;
            self.cached_roles.add_permissions(id_arg, &permissions);
            permissions
        }))
    }
}
