//! CouponUsages repo, presents per-user usage counters for coupons
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use errors::Error;
use models::{CouponId, CouponUsage, NewCouponUsage, UserId};
use repos::acl;
use repos::types::{RepoAcl, RepoResult};
use schema::coupon_usages::dsl as CouponUsages;

use models::authorization::*;

/// CouponUsages repository, responsible for handling coupon_usages table
pub struct CouponUsagesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl>,
}

pub trait CouponUsagesRepo {
    /// Get usage counter of a user for a coupon
    fn get(&self, coupon_id_arg: CouponId, user_id_arg: UserId) -> RepoResult<Option<CouponUsage>>;

    /// Increment the usage counter of a user, creating it at 1 when
    /// absent and refusing to pass `limit` in one conditional update.
    fn register_usage(&self, coupon_id_arg: CouponId, user_id_arg: UserId, limit: i32) -> RepoResult<CouponUsage>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CouponUsagesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CouponUsagesRepo
    for CouponUsagesRepoImpl<'a, T>
{
    /// Get usage counter of a user for a coupon
    fn get(&self, coupon_id_arg: CouponId, user_id_arg: UserId) -> RepoResult<Option<CouponUsage>> {
        debug!("Find coupon usage for coupon {} and user {}.", coupon_id_arg, user_id_arg);
        acl::check(&*self.acl, Resource::CouponUsages, Action::Read)?;

        let query = CouponUsages::coupon_usages
            .filter(CouponUsages::coupon_id.eq(&coupon_id_arg))
            .filter(CouponUsages::user_id.eq(&user_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Find coupon usage for coupon {} and user {} error occurred",
                    coupon_id_arg, user_id_arg
                )).into()
            })
    }

    /// Increment the usage counter of a user, creating it at 1 when absent
    fn register_usage(&self, coupon_id_arg: CouponId, user_id_arg: UserId, limit: i32) -> RepoResult<CouponUsage> {
        debug!(
            "Register coupon usage for coupon {} and user {} with limit {}.",
            coupon_id_arg, user_id_arg, limit
        );
        acl::check(&*self.acl, Resource::CouponUsages, Action::Update)?;

        let filtered = CouponUsages::coupon_usages
            .filter(CouponUsages::coupon_id.eq(&coupon_id_arg))
            .filter(CouponUsages::user_id.eq(&user_id_arg))
            .filter(CouponUsages::usage_count.lt(limit));
        let incremented = diesel::update(filtered)
            .set(CouponUsages::usage_count.eq(CouponUsages::usage_count + 1))
            .get_result::<CouponUsage>(self.db_conn)
            .optional()
            .map_err(|e| -> FailureError { Error::from(e).into() })?;

        if let Some(usage) = incremented {
            return Ok(usage);
        }

        // Nothing matched: either the counter is absent, or it sits
        // at the ceiling already.
        let existing = self.get(coupon_id_arg, user_id_arg)?;
        if existing.is_some() || limit < 1 {
            return Err(format_err!(
                "Usage limit of coupon {} exhausted for user {}",
                coupon_id_arg,
                user_id_arg
            ).context(Error::InvalidRequest(
                "You have reached the usage limit for this coupon".to_string(),
            )).into());
        }

        let payload = NewCouponUsage {
            coupon_id: coupon_id_arg,
            user_id: user_id_arg,
            usage_count: 1,
        };
        let query = diesel::insert_into(CouponUsages::coupon_usages).values(&payload);
        query
            .get_result::<CouponUsage>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| {
                e.context(format!("Register coupon usage: {:?} error occurred", payload))
                    .into()
            })
    }
}
