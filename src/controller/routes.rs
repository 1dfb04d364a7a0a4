use controller::router::RouteParser;
use models::{CouponId, RoleId};

/// List of all routes with params for the app
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Healthcheck,
    Coupons,
    Coupon(CouponId),
    CouponsSearchCode,
    CouponsGenerateCode,
    CouponsApply,
    CouponsPreview,
    Roles,
    Role(RoleId),
}

pub fn create_route_parser() -> RouteParser<Route> {
    let mut router = RouteParser::default();

    // Healthcheck
    router.add_route(r"^/healthcheck$", || Route::Healthcheck);

    // Coupons routes
    router.add_route(r"^/coupons$", || Route::Coupons);

    // Coupons search by code route
    router.add_route(r"^/coupons/search/code$", || Route::CouponsSearchCode);

    // Coupons generate code route
    router.add_route(r"^/coupons/generate_code$", || Route::CouponsGenerateCode);

    // Coupons apply route
    router.add_route(r"^/coupons/apply$", || Route::CouponsApply);

    // Coupons preview route
    router.add_route(r"^/coupons/preview$", || Route::CouponsPreview);

    // Coupons/:id route
    router.add_route_with_params(r"^/coupons/(\d+)$", |params| {
        params
            .get(0)
            .and_then(|string_id| string_id.parse::<i32>().ok())
            .map(|coupon_id| Route::Coupon(CouponId(coupon_id)))
    });

    // Roles routes
    router.add_route(r"^/roles$", || Route::Roles);

    // Roles/:id route
    router.add_route_with_params(r"^/roles/(\d+)$", |params| {
        params
            .get(0)
            .and_then(|string_id| string_id.parse::<i32>().ok())
            .map(|role_id| Route::Role(RoleId(role_id)))
    });

    router
}
