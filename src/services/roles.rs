//! Roles Services, presents CRUD operations with roles

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;
use validator::Validate;

use errors::Error;
use models::{NewRole, Role, RoleId, UpdateRole};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait RolesService {
    /// Creates new role
    fn create_role(&self, payload: NewRole) -> ServiceFuture<Role>;
    /// Returns all roles
    fn list_roles(&self) -> ServiceFuture<Vec<Role>>;
    /// Returns role by id
    fn get_role(&self, id_arg: RoleId) -> ServiceFuture<Option<Role>>;
    /// Update role
    fn update_role(&self, id_arg: RoleId, payload: UpdateRole) -> ServiceFuture<Role>;
    /// Deletes role
    fn delete_role(&self, id_arg: RoleId) -> ServiceFuture<Role>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > RolesService for Service<T, M, F>
{
    /// Creates new role
    fn create_role(&self, payload: NewRole) -> ServiceFuture<Role> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            {
                payload
                    .validate()
                    .map_err(|e| FailureError::from(Error::Validate(e)))?;
                let roles_repo = repo_factory.create_roles_repo(&*conn, user_id);
                conn.transaction::<Role, FailureError, _>(move || roles_repo.create(payload))
            }.map_err(|e: FailureError| e.context("Service Roles, create_role endpoint error occurred.").into())
        })
    }

    /// Returns all roles
    fn list_roles(&self) -> ServiceFuture<Vec<Role>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let roles_repo = repo_factory.create_roles_repo(&*conn, user_id);

            roles_repo
                .list()
                .map_err(|e| e.context("Service Roles, list_roles endpoint error occurred.").into())
        })
    }

    /// Returns role by id
    fn get_role(&self, id_arg: RoleId) -> ServiceFuture<Option<Role>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let roles_repo = repo_factory.create_roles_repo(&*conn, user_id);

            roles_repo
                .get(id_arg)
                .map_err(|e| e.context("Service Roles, get_role endpoint error occurred.").into())
        })
    }

    /// Update role
    fn update_role(&self, id_arg: RoleId, payload: UpdateRole) -> ServiceFuture<Role> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            {
                payload
                    .validate()
                    .map_err(|e| FailureError::from(Error::Validate(e)))?;
                let roles_repo = repo_factory.create_roles_repo(&*conn, user_id);
                roles_repo.update(id_arg, payload)
            }.map_err(|e: FailureError| e.context("Service Roles, update_role endpoint error occurred.").into())
        })
    }

    /// Deletes role
    fn delete_role(&self, id_arg: RoleId) -> ServiceFuture<Role> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let roles_repo = repo_factory.create_roles_repo(&*conn, user_id);

            roles_repo
                .delete(id_arg)
                .map_err(|e| e.context("Service Roles, delete_role endpoint error occurred.").into())
        })
    }
}
