use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;

use models::UserId;
use repos::acl::{ApplicationAcl, RoleGrants, RolesCacheImpl, SystemACL, UnauthorizedAcl};
use repos::*;

pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>: Clone + Send + 'static {
    fn create_coupons_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CouponsRepo + 'a>;
    fn create_coupons_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<CouponsRepo + 'a>;
    fn create_coupon_usages_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CouponUsagesRepo + 'a>;
    fn create_coupon_usages_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<CouponUsagesRepo + 'a>;
    fn create_roles_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<RolesRepo + 'a>;
    fn create_roles_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<RolesRepo + 'a>;
    fn create_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UsersRepo + 'a>;
}

#[derive(Clone)]
pub struct ReposFactoryImpl {
    roles_cache: RolesCacheImpl,
}

impl ReposFactoryImpl {
    pub fn new(roles_cache: RolesCacheImpl) -> Self {
        Self { roles_cache }
    }

    /// Resolves the grants of a user. Any fault here is logged and
    /// collapsed into a denial - callers never see the cause.
    fn resolve_grants<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        id: UserId,
        db_conn: &C,
    ) -> RoleGrants {
        let user = match self.create_users_repo_with_sys_acl(db_conn).find(id) {
            Ok(user) => user,
            Err(e) => {
                error!("Failed to load user {}: {}.", id, e);
                return RoleGrants::Misconfigured;
            }
        };
        let user = match user {
            Some(user) => user,
            None => return RoleGrants::MissingUser,
        };
        if user.is_admin {
            return RoleGrants::Admin;
        }
        let role_id = match user.role_id {
            Some(role_id) => role_id,
            None => return RoleGrants::Customer,
        };
        match self.create_roles_repo_with_sys_acl(db_conn).permissions_for_role(role_id) {
            Ok(Some(permissions)) => RoleGrants::Role(permissions),
            Ok(None) => {
                error!("Invalid role configuration for user {}: role {} not found.", id, role_id);
                RoleGrants::Misconfigured
            }
            Err(e) => {
                error!("Failed to load permissions of role {} for user {}: {}.", role_id, id, e);
                RoleGrants::Misconfigured
            }
        }
    }

    fn get_acl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        db_conn: &C,
        user_id: Option<UserId>,
    ) -> Box<RepoAcl> {
        user_id.map_or(Box::new(UnauthorizedAcl::default()) as Box<RepoAcl>, |id| {
            let grants = self.resolve_grants(id, db_conn);
            Box::new(ApplicationAcl::new(id, grants)) as Box<RepoAcl>
        })
    }
}

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryImpl {
    fn create_coupons_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CouponsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(CouponsRepoImpl::new(db_conn, acl)) as Box<CouponsRepo>
    }
    fn create_coupons_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<CouponsRepo + 'a> {
        Box::new(CouponsRepoImpl::new(db_conn, Box::new(SystemACL::default()) as Box<RepoAcl>)) as Box<CouponsRepo>
    }
    fn create_coupon_usages_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CouponUsagesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(CouponUsagesRepoImpl::new(db_conn, acl)) as Box<CouponUsagesRepo>
    }
    fn create_coupon_usages_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<CouponUsagesRepo + 'a> {
        Box::new(CouponUsagesRepoImpl::new(db_conn, Box::new(SystemACL::default()) as Box<RepoAcl>)) as Box<CouponUsagesRepo>
    }
    fn create_roles_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<RolesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(RolesRepoImpl::new(db_conn, acl, self.roles_cache.clone())) as Box<RolesRepo>
    }
    fn create_roles_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<RolesRepo + 'a> {
        Box::new(RolesRepoImpl::new(
            db_conn,
            Box::new(SystemACL::default()) as Box<RepoAcl>,
            self.roles_cache.clone(),
        )) as Box<RolesRepo>
    }
    fn create_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UsersRepo + 'a> {
        Box::new(UsersRepoImpl::new(db_conn, Box::new(SystemACL::default()) as Box<RepoAcl>)) as Box<UsersRepo>
    }
}

#[cfg(test)]
pub mod tests {

    use std::error::Error;
    use std::fmt;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use diesel::connection::AnsiTransactionManager;
    use diesel::connection::SimpleConnection;
    use diesel::deserialize::QueryableByName;
    use diesel::pg::Pg;
    use diesel::query_builder::AsQuery;
    use diesel::query_builder::QueryFragment;
    use diesel::query_builder::QueryId;
    use diesel::sql_types::HasSqlType;
    use diesel::Connection;
    use diesel::ConnectionResult;
    use diesel::QueryResult;
    use diesel::Queryable;
    use futures_cpupool::CpuPool;
    use r2d2;
    use r2d2::ManageConnection;

    use config::Config;
    use controller::context::{DynamicContext, StaticContext};
    use errors::Error as ApiError;
    use models::*;
    use repos::*;
    use services::Service;

    pub const MOCK_REPO_FACTORY: ReposFactoryMock = ReposFactoryMock {};
    pub static MOCK_ADMIN_ID: UserId = UserId(1);
    pub static MOCK_MANAGER_ID: UserId = UserId(2);
    pub static MOCK_CUSTOMER_ID: UserId = UserId(3);
    pub static MOCK_EXHAUSTED_USER_ID: UserId = UserId(5);
    pub static MOCK_COUPON_ID: CouponId = CouponId(1);
    pub static MOCK_FREEBIE_COUPON_ID: CouponId = CouponId(2);
    pub static MOCK_SOLDOUT_COUPON_ID: CouponId = CouponId(3);
    pub static MOCK_EXPIRED_COUPON_ID: CouponId = CouponId(4);
    pub static MOCK_ROLE_ID: RoleId = RoleId(1);
    pub static MOCK_COUPON_CODE: &'static str = "SAVE10";
    pub static MOCK_FREEBIE_COUPON_CODE: &'static str = "FREEBIE";
    pub static MOCK_SOLDOUT_COUPON_CODE: &'static str = "SOLDOUT";
    pub static MOCK_EXPIRED_COUPON_CODE: &'static str = "EXPIRED";

    pub fn create_service(user_id: Option<UserId>) -> Service<MockConnection, MockConnectionManager, ReposFactoryMock> {
        let manager = MockConnectionManager::default();
        let db_pool = r2d2::Pool::builder().build(manager).expect("Failed to create connection pool");
        let cpu_pool = CpuPool::new(1);

        let config = Config::new().unwrap();
        let static_context = StaticContext::new(db_pool, cpu_pool, Arc::new(config), MOCK_REPO_FACTORY);
        let dynamic_context = DynamicContext::new(user_id);

        Service::new(static_context, dynamic_context)
    }

    pub fn create_coupon(id: CouponId, code: &str, discount: DiscountSpec) -> Coupon {
        Coupon {
            id,
            code: CouponCode(code.to_string()),
            title: "title".to_string(),
            discount,
            usage_limit_per_user: 3,
            total_usage_limit: 100,
            used_count: 0,
            is_active: true,
            expires_at: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    pub fn percentage_coupon() -> Coupon {
        create_coupon(
            MOCK_COUPON_ID,
            MOCK_COUPON_CODE,
            DiscountSpec::Percentage {
                value: 10.0,
                min_order_amount: 50.0,
                max_discount_amount: Some(20.0),
                max_word_count: None,
            },
        )
    }

    pub fn freebie_coupon() -> Coupon {
        let mut coupon = create_coupon(
            MOCK_FREEBIE_COUPON_ID,
            MOCK_FREEBIE_COUPON_CODE,
            DiscountSpec::Percentage {
                value: 100.0,
                min_order_amount: 0.0,
                max_discount_amount: None,
                max_word_count: Some(500),
            },
        );
        coupon.usage_limit_per_user = 1;
        coupon.total_usage_limit = 10;
        coupon
    }

    pub fn soldout_coupon() -> Coupon {
        let mut coupon = create_coupon(
            MOCK_SOLDOUT_COUPON_ID,
            MOCK_SOLDOUT_COUPON_CODE,
            DiscountSpec::Flat {
                value: 5.0,
                min_order_amount: 0.0,
            },
        );
        coupon.total_usage_limit = 5;
        coupon.used_count = 5;
        coupon
    }

    pub fn expired_coupon() -> Coupon {
        let mut coupon = create_coupon(
            MOCK_EXPIRED_COUPON_ID,
            MOCK_EXPIRED_COUPON_CODE,
            DiscountSpec::Flat {
                value: 5.0,
                min_order_amount: 0.0,
            },
        );
        coupon.expires_at = Some(SystemTime::now() - Duration::from_secs(86400));
        coupon
    }

    pub fn manager_role() -> Role {
        Role {
            id: MOCK_ROLE_ID,
            name: "managers".to_string(),
            is_active: true,
            permissions: RolePermissions(vec![
                ModulePermissions::new("coupons", vec![0, 1, 2, 3]),
                ModulePermissions::new("roles", vec![0, 1, 2, 3]),
            ]),
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[derive(Default, Copy, Clone)]
    pub struct ReposFactoryMock;

    impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryMock {
        fn create_coupons_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<CouponsRepo + 'a> {
            Box::new(CouponsRepoMock::default()) as Box<CouponsRepo>
        }
        fn create_coupons_repo_with_sys_acl<'a>(&self, _db_conn: &'a C) -> Box<CouponsRepo + 'a> {
            Box::new(CouponsRepoMock::default()) as Box<CouponsRepo>
        }
        fn create_coupon_usages_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<CouponUsagesRepo + 'a> {
            Box::new(CouponUsagesRepoMock::default()) as Box<CouponUsagesRepo>
        }
        fn create_coupon_usages_repo_with_sys_acl<'a>(&self, _db_conn: &'a C) -> Box<CouponUsagesRepo + 'a> {
            Box::new(CouponUsagesRepoMock::default()) as Box<CouponUsagesRepo>
        }
        fn create_roles_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<RolesRepo + 'a> {
            Box::new(RolesRepoMock::default()) as Box<RolesRepo>
        }
        fn create_roles_repo_with_sys_acl<'a>(&self, _db_conn: &'a C) -> Box<RolesRepo + 'a> {
            Box::new(RolesRepoMock::default()) as Box<RolesRepo>
        }
        fn create_users_repo_with_sys_acl<'a>(&self, _db_conn: &'a C) -> Box<UsersRepo + 'a> {
            Box::new(UsersRepoMock::default()) as Box<UsersRepo>
        }
    }

    #[derive(Clone, Default)]
    pub struct CouponsRepoMock;

    impl CouponsRepo for CouponsRepoMock {
        fn create(&self, payload: NewCoupon) -> RepoResult<Coupon> {
            Ok(Coupon {
                id: MOCK_COUPON_ID,
                code: CouponCode(payload.code.0.to_uppercase()),
                title: payload.title,
                discount: payload.discount,
                usage_limit_per_user: payload.usage_limit_per_user,
                total_usage_limit: payload.total_usage_limit,
                used_count: 0,
                is_active: true,
                expires_at: payload.expires_at,
                created_at: SystemTime::now(),
                updated_at: SystemTime::now(),
            })
        }

        fn list(&self) -> RepoResult<Vec<Coupon>> {
            Ok(vec![percentage_coupon(), freebie_coupon()])
        }

        fn get(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>> {
            match id_arg {
                id if id == MOCK_COUPON_ID => Ok(Some(percentage_coupon())),
                id if id == MOCK_FREEBIE_COUPON_ID => Ok(Some(freebie_coupon())),
                id if id == MOCK_SOLDOUT_COUPON_ID => Ok(Some(soldout_coupon())),
                id if id == MOCK_EXPIRED_COUPON_ID => Ok(Some(expired_coupon())),
                _ => Ok(None),
            }
        }

        fn get_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>> {
            self.find_active_by_code(code_arg)
        }

        fn find_active_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>> {
            match code_arg.0.to_uppercase() {
                ref code if code == MOCK_COUPON_CODE => Ok(Some(percentage_coupon())),
                ref code if code == MOCK_FREEBIE_COUPON_CODE => Ok(Some(freebie_coupon())),
                ref code if code == MOCK_SOLDOUT_COUPON_CODE => Ok(Some(soldout_coupon())),
                ref code if code == MOCK_EXPIRED_COUPON_CODE => Ok(Some(expired_coupon())),
                _ => Ok(None),
            }
        }

        fn update(&self, id_arg: CouponId, payload: UpdateCoupon) -> RepoResult<Coupon> {
            let mut coupon = self.get(id_arg)?.ok_or_else(|| {
                failure::Error::from(ApiError::NotFound("Entity not found".to_string()))
            })?;
            if let Some(title) = payload.title {
                coupon.title = title;
            }
            if let Some(is_active) = payload.is_active {
                coupon.is_active = is_active;
            }
            Ok(coupon)
        }

        fn delete(&self, id_arg: CouponId) -> RepoResult<Coupon> {
            Ok(percentage_coupon_with_id(id_arg))
        }

        fn increment_used_count(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>> {
            let coupon = self.get(id_arg)?;
            Ok(coupon.and_then(|mut coupon| {
                if coupon.used_count < coupon.total_usage_limit {
                    coupon.used_count += 1;
                    Some(coupon)
                } else {
                    None
                }
            }))
        }
    }

    fn percentage_coupon_with_id(id: CouponId) -> Coupon {
        let mut coupon = percentage_coupon();
        coupon.id = id;
        coupon
    }

    #[derive(Clone, Default)]
    pub struct CouponUsagesRepoMock;

    impl CouponUsagesRepo for CouponUsagesRepoMock {
        fn get(&self, coupon_id_arg: CouponId, user_id_arg: UserId) -> RepoResult<Option<CouponUsage>> {
            if user_id_arg == MOCK_EXHAUSTED_USER_ID {
                Ok(Some(CouponUsage {
                    coupon_id: coupon_id_arg,
                    user_id: user_id_arg,
                    usage_count: 3,
                }))
            } else {
                Ok(None)
            }
        }

        fn register_usage(&self, coupon_id_arg: CouponId, user_id_arg: UserId, limit: i32) -> RepoResult<CouponUsage> {
            match self.get(coupon_id_arg, user_id_arg)? {
                Some(ref usage) if usage.usage_count >= limit => Err(failure::Error::from(ApiError::InvalidRequest(
                    "You have reached the usage limit for this coupon".to_string(),
                ))),
                Some(usage) => Ok(CouponUsage {
                    usage_count: usage.usage_count + 1,
                    ..usage
                }),
                None => Ok(CouponUsage {
                    coupon_id: coupon_id_arg,
                    user_id: user_id_arg,
                    usage_count: 1,
                }),
            }
        }
    }

    #[derive(Clone, Default)]
    pub struct RolesRepoMock;

    impl RolesRepo for RolesRepoMock {
        fn create(&self, payload: NewRole) -> RepoResult<Role> {
            Ok(Role {
                id: MOCK_ROLE_ID,
                name: payload.name,
                is_active: payload.is_active,
                permissions: payload.permissions,
                created_at: SystemTime::now(),
                updated_at: SystemTime::now(),
            })
        }

        fn list(&self) -> RepoResult<Vec<Role>> {
            Ok(vec![manager_role()])
        }

        fn get(&self, id_arg: RoleId) -> RepoResult<Option<Role>> {
            if id_arg == MOCK_ROLE_ID {
                Ok(Some(manager_role()))
            } else {
                Ok(None)
            }
        }

        fn update(&self, id_arg: RoleId, payload: UpdateRole) -> RepoResult<Role> {
            let mut role = self.get(id_arg)?.ok_or_else(|| {
                failure::Error::from(ApiError::NotFound("Entity not found".to_string()))
            })?;
            if let Some(name) = payload.name {
                role.name = name;
            }
            if let Some(is_active) = payload.is_active {
                role.is_active = is_active;
            }
            if let Some(permissions) = payload.permissions {
                role.permissions = permissions;
            }
            Ok(role)
        }

        fn delete(&self, _id_arg: RoleId) -> RepoResult<Role> {
            Ok(manager_role())
        }

        fn permissions_for_role(&self, id_arg: RoleId) -> RepoResult<Option<Vec<ModulePermissions>>> {
            Ok(self.get(id_arg)?.map(|role| role.permissions.0))
        }
    }

    #[derive(Clone, Default)]
    pub struct UsersRepoMock;

    impl UsersRepo for UsersRepoMock {
        fn find(&self, user_id_arg: UserId) -> RepoResult<Option<User>> {
            let user = |is_admin: bool, role_id: Option<RoleId>| User {
                id: user_id_arg,
                email: format!("user{}@example.com", user_id_arg),
                is_admin,
                role_id,
                created_at: SystemTime::now(),
                updated_at: SystemTime::now(),
            };
            match user_id_arg {
                id if id == MOCK_ADMIN_ID => Ok(Some(user(true, None))),
                id if id == MOCK_MANAGER_ID => Ok(Some(user(false, Some(MOCK_ROLE_ID)))),
                id if id == MOCK_CUSTOMER_ID => Ok(Some(user(false, None))),
                id if id == MOCK_EXHAUSTED_USER_ID => Ok(Some(user(false, None))),
                _ => Ok(None),
            }
        }
    }

    #[derive(Default)]
    pub struct MockConnection {
        tr: AnsiTransactionManager,
    }

    impl Connection for MockConnection {
        type Backend = Pg;
        type TransactionManager = AnsiTransactionManager;

        fn establish(_database_url: &str) -> ConnectionResult<MockConnection> {
            Ok(MockConnection::default())
        }

        fn execute(&self, _query: &str) -> QueryResult<usize> {
            unimplemented!()
        }

        fn query_by_index<T, U>(&self, _source: T) -> QueryResult<Vec<U>>
        where
            T: AsQuery,
            T::Query: QueryFragment<Pg> + QueryId,
            Pg: HasSqlType<T::SqlType>,
            U: Queryable<T::SqlType, Pg>,
        {
            unimplemented!()
        }

        fn query_by_name<T, U>(&self, _source: &T) -> QueryResult<Vec<U>>
        where
            T: QueryFragment<Pg> + QueryId,
            U: QueryableByName<Pg>,
        {
            unimplemented!()
        }

        fn execute_returning_count<T>(&self, _source: &T) -> QueryResult<usize>
        where
            T: QueryFragment<Pg> + QueryId,
        {
            unimplemented!()
        }

        fn transaction_manager(&self) -> &Self::TransactionManager {
            &self.tr
        }
    }

    impl SimpleConnection for MockConnection {
        fn batch_execute(&self, _query: &str) -> QueryResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockConnectionManager;

    impl ManageConnection for MockConnectionManager {
        type Connection = MockConnection;
        type Error = MockError;

        fn connect(&self) -> Result<MockConnection, MockError> {
            Ok(MockConnection::default())
        }

        fn is_valid(&self, _conn: &mut MockConnection) -> Result<(), MockError> {
            Ok(())
        }

        fn has_broken(&self, _conn: &mut MockConnection) -> bool {
            false
        }
    }

    #[derive(Debug)]
    pub struct MockError {}

    impl fmt::Display for MockError {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "Mock connection error")
        }
    }

    impl Error for MockError {
        fn description(&self) -> &str {
            "Mock connection error"
        }

        fn cause(&self) -> Option<&Error> {
            None
        }
    }
}
