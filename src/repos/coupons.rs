//! Coupons repo, presents CRUD operations with db for coupons
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use errors::Error;
use models::{Coupon, CouponCode, CouponId, NewCoupon, UpdateCoupon};
use repos::acl;
use repos::types::{RepoAcl, RepoResult};
use schema::coupons::dsl as Coupons;

use models::authorization::*;

/// Coupons repository, responsible for handling coupons
pub struct CouponsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl>,
}

pub trait CouponsRepo {
    /// Creates new coupon
    fn create(&self, payload: NewCoupon) -> RepoResult<Coupon>;

    /// List all coupons
    fn list(&self) -> RepoResult<Vec<Coupon>>;

    /// Get coupon
    fn get(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>>;

    /// Get coupon by code
    fn get_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>>;

    /// Get active coupon by code; expiry is checked by the caller
    fn find_active_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>>;

    /// Update coupon
    fn update(&self, id_arg: CouponId, payload: UpdateCoupon) -> RepoResult<Coupon>;

    /// Delete coupon
    fn delete(&self, id_arg: CouponId) -> RepoResult<Coupon>;

    /// Increment the global usage counter, refusing to pass the
    /// total usage limit. Returns `None` when the ceiling is already
    /// reached, in one conditional update.
    fn increment_used_count(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CouponsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CouponsRepo for CouponsRepoImpl<'a, T> {
    /// Creates new coupon
    fn create(&self, payload: NewCoupon) -> RepoResult<Coupon> {
        debug!("Create new coupon {:?}.", payload);
        acl::check(&*self.acl, Resource::Coupons, Action::Create)?;

        let mut payload = payload;
        payload.code = payload.code.0.to_uppercase().into();

        let query = diesel::insert_into(Coupons::coupons).values(&payload);
        query
            .get_result::<Coupon>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Creates new coupon: {:?} error occurred", payload)).into())
    }

    /// List all coupons
    fn list(&self) -> RepoResult<Vec<Coupon>> {
        debug!("Find all coupons.");
        acl::check(&*self.acl, Resource::Coupons, Action::Read)?;

        let query = Coupons::coupons.order(Coupons::id);
        query
            .get_results(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context("List all coupons").into())
    }

    /// Get coupon
    fn get(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>> {
        debug!("Find in coupon with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Coupons, Action::Read)?;

        let query = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Find coupon by id: {} error occurred", id_arg)).into())
    }

    /// Get coupon by code
    fn get_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>> {
        debug!("Find in coupon with code {}.", code_arg);
        acl::check(&*self.acl, Resource::Coupons, Action::Read)?;

        let code_arg: CouponCode = code_arg.0.to_uppercase().into();
        let query = Coupons::coupons.filter(Coupons::code.eq(&code_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Find coupon by code: {} error occurred", code_arg)).into())
    }

    /// Get active coupon by code; expiry is checked by the caller
    fn find_active_by_code(&self, code_arg: CouponCode) -> RepoResult<Option<Coupon>> {
        debug!("Find active coupon with code {}.", code_arg);
        acl::check(&*self.acl, Resource::Coupons, Action::Read)?;

        let code_arg: CouponCode = code_arg.0.to_uppercase().into();
        let query = Coupons::coupons
            .filter(Coupons::code.eq(&code_arg))
            .filter(Coupons::is_active.eq(true));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Find active coupon by code: {} error occurred", code_arg)).into())
    }

    /// Update coupon
    fn update(&self, id_arg: CouponId, payload: UpdateCoupon) -> RepoResult<Coupon> {
        debug!("Updating coupon with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::Coupons, Action::Update)?;

        let filtered = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
        let query = diesel::update(filtered).set(&payload);
        query
            .get_result::<Coupon>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Updates specific coupon: id: {}, payload: {:?}, error occurred",
                    id_arg, payload
                )).into()
            })
    }

    /// Delete coupon
    fn delete(&self, id_arg: CouponId) -> RepoResult<Coupon> {
        debug!("Delete coupon with id {:?}.", id_arg);
        acl::check(&*self.acl, Resource::Coupons, Action::Delete)?;

        let filtered = Coupons::coupons.filter(Coupons::id.eq(&id_arg));
        let query = diesel::delete(filtered);
        query
            .get_result::<Coupon>(self.db_conn)
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| e.context(format!("Delete coupon: {:?} error occurred", id_arg)).into())
    }

    /// Increment the global usage counter, refusing to pass the limit
    fn increment_used_count(&self, id_arg: CouponId) -> RepoResult<Option<Coupon>> {
        debug!("Increment used count of coupon with id {}.", id_arg);
        acl::check(&*self.acl, Resource::Coupons, Action::Update)?;

        let filtered = Coupons::coupons
            .filter(Coupons::id.eq(&id_arg))
            .filter(Coupons::used_count.lt(Coupons::total_usage_limit));
        let query = diesel::update(filtered).set(Coupons::used_count.eq(Coupons::used_count + 1));
        query
            .get_result::<Coupon>(self.db_conn)
            .optional()
            .map_err(|e| Error::from(e).into())
            .map_err(|e: FailureError| {
                e.context(format!("Increment used count of coupon: {} error occurred", id_arg))
                    .into()
            })
    }
}
