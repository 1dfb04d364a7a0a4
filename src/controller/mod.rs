//! `Controller` is a top layer that handles all http-related
//! stuff like reading bodies, parsing params, forming a response.
//! Basically it provides inputs to `Service` layer and converts outputs
//! of `Service` layer to http responses

pub mod context;
pub mod router;
pub mod routes;
pub mod types;
pub mod utils;

use std::sync::Arc;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::{future, Future};
use hyper;
use hyper::header::{Authorization, ContentLength, ContentType};
use hyper::server::{Request, Response, Service as HyperService};
use hyper::{Delete, Get, Post, Put, StatusCode};
use r2d2::ManageConnection;
use serde_json;

use self::context::{DynamicContext, StaticContext};
use self::router::RouteParser;
use self::routes::{create_route_parser, Route};
use self::types::{ControllerFuture, ErrorMessage};
use self::utils::parse_body;
use errors::{error_kind, Error};
use models::{ApplyCouponPayload, CouponsSearchCodePayload, NewCoupon, NewRole, UpdateCoupon, UpdateRole, UserId};
use repos::repo_factory::ReposFactory;
use services::coupons::CouponsService;
use services::roles::RolesService;
use services::system::{SystemService, SystemServiceImpl};
use services::Service;

macro_rules! serialize_future {
    ($e:expr) => {
        Box::new(
            $e.and_then(|resp| serde_json::to_string(&resp).map_err(|e| FailureError::from(e.context(Error::Internal)))),
        )
    };
}

/// Controller handles route parsing and calling `Service` layer
pub struct ControllerImpl<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub static_context: StaticContext<T, M, F>,
    pub route_parser: Arc<RouteParser<Route>>,
}

impl<T, M, F> ControllerImpl<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    /// Create a new controller based on static context
    pub fn new(static_context: StaticContext<T, M, F>) -> Self {
        let route_parser = Arc::new(create_route_parser());
        Self {
            static_context,
            route_parser,
        }
    }

    /// Handle a request and get future response
    pub fn call(&self, req: Request) -> ControllerFuture {
        let method = req.method().clone();
        let path = req.path().to_string();
        let route = self.route_parser.test(req.path());

        let user_id = req
            .headers()
            .get::<Authorization<String>>()
            .and_then(|auth| auth.0.parse::<i32>().ok())
            .map(UserId);

        let dynamic_context = DynamicContext::new(user_id);
        let service = Service::new(self.static_context.clone(), dynamic_context);

        let body = req.body();

        match (&method, route) {
            // GET /healthcheck
            (&Get, Some(Route::Healthcheck)) => serialize_future!(SystemServiceImpl::new().healthcheck()),

            // POST /coupons
            (&Post, Some(Route::Coupons)) => serialize_future!(
                parse_body::<NewCoupon>(body).and_then(move |new_coupon| service.create_coupon(new_coupon))
            ),

            // GET /coupons
            (&Get, Some(Route::Coupons)) => serialize_future!(service.list_coupons()),

            // GET /coupons/<coupon_id>
            (&Get, Some(Route::Coupon(coupon_id))) => serialize_future!(service.get_coupon(coupon_id)),

            // PUT /coupons/<coupon_id>
            (&Put, Some(Route::Coupon(coupon_id))) => serialize_future!(
                parse_body::<UpdateCoupon>(body).and_then(move |update_coupon| service.update_coupon(coupon_id, update_coupon))
            ),

            // DELETE /coupons/<coupon_id>
            (&Delete, Some(Route::Coupon(coupon_id))) => serialize_future!(service.delete_coupon(coupon_id)),

            // POST /coupons/search/code
            (&Post, Some(Route::CouponsSearchCode)) => serialize_future!(
                parse_body::<CouponsSearchCodePayload>(body).and_then(move |payload| service.get_coupon_by_code(payload))
            ),

            // POST /coupons/generate_code
            (&Post, Some(Route::CouponsGenerateCode)) => serialize_future!(service.generate_coupon_code()),

            // POST /coupons/apply
            (&Post, Some(Route::CouponsApply)) => serialize_future!(
                parse_body::<ApplyCouponPayload>(body).and_then(move |payload| service.apply_coupon(payload))
            ),

            // POST /coupons/preview
            (&Post, Some(Route::CouponsPreview)) => serialize_future!(
                parse_body::<ApplyCouponPayload>(body).and_then(move |payload| service.preview_coupon_discount(payload))
            ),

            // POST /roles
            (&Post, Some(Route::Roles)) => {
                serialize_future!(parse_body::<NewRole>(body).and_then(move |new_role| service.create_role(new_role)))
            }

            // GET /roles
            (&Get, Some(Route::Roles)) => serialize_future!(service.list_roles()),

            // GET /roles/<role_id>
            (&Get, Some(Route::Role(role_id))) => serialize_future!(service.get_role(role_id)),

            // PUT /roles/<role_id>
            (&Put, Some(Route::Role(role_id))) => serialize_future!(
                parse_body::<UpdateRole>(body).and_then(move |update_role| service.update_role(role_id, update_role))
            ),

            // DELETE /roles/<role_id>
            (&Delete, Some(Route::Role(role_id))) => serialize_future!(service.delete_role(role_id)),

            // Fallback
            _ => Box::new(future::err(
                Error::NotFound(format!("Request route not found: {} {}", method, path)).into(),
            )),
        }
    }
}

/// Application glues the controller to the hyper server: successful
/// controller output is served as JSON, failures are mapped to
/// `{code, message, errors?}` payloads with the matching status.
pub struct Application<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub controller: ControllerImpl<T, M, F>,
}

impl<T, M, F> Application<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub fn new(controller: ControllerImpl<T, M, F>) -> Self {
        Self { controller }
    }
}

impl<T, M, F> HyperService for Application<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    type Request = Request;
    type Response = Response;
    type Error = hyper::Error;
    type Future = Box<Future<Item = Response, Error = hyper::Error>>;

    fn call(&self, req: Request) -> Self::Future {
        debug!("Received request: {} {}", req.method(), req.path());

        Box::new(self.controller.call(req).then(|result| match result {
            Ok(data) => future::ok(response_with_json(data)),
            Err(err) => future::ok(response_with_error(&err)),
        }))
    }
}

fn response_with_body(status: StatusCode, body: String) -> Response {
    Response::new()
        .with_status(status)
        .with_header(ContentLength(body.len() as u64))
        .with_header(ContentType::json())
        .with_body(body)
}

fn response_with_json(body: String) -> Response {
    response_with_body(StatusCode::Ok, body)
}

fn response_with_error(error: &FailureError) -> Response {
    let (status, message) = match error_kind(error) {
        Some(e) => {
            let errors = match *e {
                Error::Validate(ref validation_errors) => serde_json::to_value(validation_errors).ok(),
                _ => None,
            };
            let status = e.code();
            (
                status,
                ErrorMessage {
                    code: status.as_u16(),
                    message: format!("{}", e),
                    errors,
                },
            )
        }
        None => {
            error!("Unhandled error: {}", error);
            (
                StatusCode::InternalServerError,
                ErrorMessage {
                    code: StatusCode::InternalServerError.as_u16(),
                    message: "Internal server error".to_string(),
                    errors: None,
                },
            )
        }
    };

    let body = serde_json::to_string(&message).unwrap_or_else(|_| r#"{"code":500,"message":"Internal server error"}"#.to_string());
    response_with_body(status, body)
}
