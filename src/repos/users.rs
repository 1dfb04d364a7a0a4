//! Users repo, read-only view over the directory maintained by the
//! identity service
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use errors::Error;
use models::{User, UserId};
use repos::acl;
use repos::types::{RepoAcl, RepoResult};
use schema::users::dsl as Users;

use models::authorization::*;

pub struct UsersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl>,
}

pub trait UsersRepo {
    /// Find user by id
    fn find(&self, user_id_arg: UserId) -> RepoResult<Option<User>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsersRepo for UsersRepoImpl<'a, T> {
    /// Find user by id
    fn find(&self, user_id_arg: UserId) -> RepoResult<Option<User>> {
        debug!("Find in user with id {}.", user_id_arg);
        acl::check(&*self.acl, Resource::Users, Action::Read)?;

        let query = Users::users.filter(Users::id.eq(&user_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Find user by id: {} error occurred", user_id_arg)).into())
    }
}
