//! Coupons Services, presents CRUD operations with coupons and the
//! discount application flow

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use r2d2::ManageConnection;

use failure::Error as FailureError;
use futures::future;
use futures::future::IntoFuture;

use uuid::Uuid;
use validator::Validate;

use super::types::ServiceFuture;
use errors::Error;
use models::*;
use repos::ReposFactory;
use services::Service;

pub trait CouponsService {
    /// Creates new coupon
    fn create_coupon(&self, payload: NewCoupon) -> ServiceFuture<Coupon>;
    /// Returns all coupons
    fn list_coupons(&self) -> ServiceFuture<Vec<Coupon>>;
    /// Returns coupon by id
    fn get_coupon(&self, id_arg: CouponId) -> ServiceFuture<Option<Coupon>>;
    /// Returns coupon by code
    fn get_coupon_by_code(&self, payload: CouponsSearchCodePayload) -> ServiceFuture<Option<Coupon>>;
    /// Update coupon
    fn update_coupon(&self, id_arg: CouponId, payload: UpdateCoupon) -> ServiceFuture<Coupon>;
    /// Deletes coupon
    fn delete_coupon(&self, id_arg: CouponId) -> ServiceFuture<Coupon>;
    /// Generate coupon code
    fn generate_coupon_code(&self) -> ServiceFuture<String>;
    /// Apply coupon to a cart at checkout, committing usage counters
    fn apply_coupon(&self, payload: ApplyCouponPayload) -> ServiceFuture<CouponApplication>;
    /// Preview the discount of a coupon over a cart, without
    /// touching any usage counter
    fn preview_coupon_discount(&self, payload: ApplyCouponPayload) -> ServiceFuture<CouponApplication>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CouponsService for Service<T, M, F>
{
    /// Creates new coupon
    fn create_coupon(&self, payload: NewCoupon) -> ServiceFuture<Coupon> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            {
                payload
                    .validate()
                    .map_err(|e| FailureError::from(Error::Validate(e)))?;
                let coupon_repo = repo_factory.create_coupons_repo(&*conn, user_id);
                conn.transaction::<Coupon, FailureError, _>(move || coupon_repo.create(payload))
            }.map_err(|e: FailureError| e.context("Service Coupons, create_coupon endpoint error occurred.").into())
        })
    }

    /// Returns all coupons
    fn list_coupons(&self) -> ServiceFuture<Vec<Coupon>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupon_repo = repo_factory.create_coupons_repo(&*conn, user_id);

            coupon_repo
                .list()
                .map_err(|e| e.context("Service Coupons, list_coupons endpoint error occurred.").into())
        })
    }

    /// Returns coupon by id
    fn get_coupon(&self, id_arg: CouponId) -> ServiceFuture<Option<Coupon>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupon_repo = repo_factory.create_coupons_repo(&*conn, user_id);

            coupon_repo
                .get(id_arg)
                .map_err(|e| e.context("Service Coupons, get_coupon endpoint error occurred.").into())
        })
    }

    /// Returns coupon by code
    fn get_coupon_by_code(&self, payload: CouponsSearchCodePayload) -> ServiceFuture<Option<Coupon>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupon_repo = repo_factory.create_coupons_repo(&*conn, user_id);

            coupon_repo
                .get_by_code(payload.code)
                .map_err(|e| e.context("Service Coupons, get_coupon_by_code endpoint error occurred.").into())
        })
    }

    /// Update coupon
    fn update_coupon(&self, id_arg: CouponId, payload: UpdateCoupon) -> ServiceFuture<Coupon> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            {
                payload
                    .validate()
                    .map_err(|e| FailureError::from(Error::Validate(e)))?;
                let coupon_repo = repo_factory.create_coupons_repo(&*conn, user_id);
                coupon_repo.update(id_arg, payload)
            }.map_err(|e: FailureError| e.context("Service Coupons, update_coupon endpoint error occurred.").into())
        })
    }

    /// Deletes coupon
    fn delete_coupon(&self, id_arg: CouponId) -> ServiceFuture<Coupon> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let coupon_repo = repo_factory.create_coupons_repo(&*conn, user_id);

            coupon_repo
                .delete(id_arg)
                .map_err(|e| e.context("Service Coupons, delete_coupon endpoint error occurred.").into())
        })
    }

    /// Generate coupon code
    fn generate_coupon_code(&self) -> ServiceFuture<String> {
        let new_uuid = Uuid::new_v4().simple().to_string().to_uppercase();
        let result: Result<String, FailureError> = Ok(new_uuid.chars().take(Coupon::GENERATED_CODE_LENGTH).collect::<String>());

        Box::new(result.into_future())
    }

    /// Apply coupon to a cart at checkout, committing usage counters
    fn apply_coupon(&self, payload: ApplyCouponPayload) -> ServiceFuture<CouponApplication> {
        let repo_factory = self.static_context.repo_factory.clone();

        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to apply coupon for unauthorized user")
                        .context(Error::Forbidden)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            {
                let ApplyCouponPayload { code, cart } = payload;

                let code = match code {
                    Some(code) => code,
                    None => return Ok(CouponApplication::without_coupon(&cart)),
                };

                let coupon_repo = repo_factory.create_coupons_repo_with_sys_acl(&*conn);
                let coupon_usages_repo = repo_factory.create_coupon_usages_repo_with_sys_acl(&*conn);

                conn.transaction::<CouponApplication, FailureError, _>(move || {
                    let coupon = coupon_repo
                        .find_active_by_code(code.clone())?
                        .ok_or_else(|| invalid_coupon_error(&code))?;

                    if coupon.is_expired() {
                        return Err(invalid_coupon_error(&code));
                    }

                    if let Some(usage) = coupon_usages_repo.get(coupon.id, user_id)? {
                        if usage.usage_count >= coupon.usage_limit_per_user {
                            return Err(format_err!("Usage limit of coupon {} exhausted for user {}", coupon.id, user_id)
                                .context(Error::InvalidRequest(
                                    "You have reached the usage limit for this coupon".to_string(),
                                )).into());
                        }
                    }

                    if coupon.used_count >= coupon.total_usage_limit {
                        return Err(total_limit_error(&coupon));
                    }

                    let result = calculate_discount(&coupon, &cart)?;

                    // Conditional increments: the limit checks above are
                    // only advisory, these refuse to pass the ceilings
                    // even when two applications race past the checks.
                    coupon_usages_repo.register_usage(coupon.id, user_id, coupon.usage_limit_per_user)?;
                    let coupon = coupon_repo
                        .increment_used_count(coupon.id)?
                        .ok_or_else(|| total_limit_error(&coupon))?;

                    Ok(CouponApplication::new(coupon, &cart, result))
                })
            }.map_err(|e: FailureError| e.context("Service Coupons, apply_coupon endpoint error occurred.").into())
        })
    }

    /// Preview the discount of a coupon over a cart
    fn preview_coupon_discount(&self, payload: ApplyCouponPayload) -> ServiceFuture<CouponApplication> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            {
                let ApplyCouponPayload { code, cart } = payload;

                if cart.products.is_empty() {
                    return Err(format_err!("Discount preview requested for an empty cart")
                        .context(Error::InvalidRequest("Cart cannot be empty".to_string()))
                        .into());
                }

                let code = match code {
                    Some(code) => code,
                    None => return Ok(CouponApplication::without_coupon(&cart)),
                };

                let coupon_repo = repo_factory.create_coupons_repo_with_sys_acl(&*conn);
                let coupon = coupon_repo
                    .find_active_by_code(code.clone())?
                    .ok_or_else(|| invalid_coupon_error(&code))?;

                if coupon.is_expired() {
                    return Err(invalid_coupon_error(&code));
                }

                let result = calculate_discount(&coupon, &cart)?;

                Ok(CouponApplication::new(coupon, &cart, result))
            }.map_err(|e: FailureError| {
                e.context("Service Coupons, preview_coupon_discount endpoint error occurred.")
                    .into()
            })
        })
    }
}

fn invalid_coupon_error(code: &CouponCode) -> FailureError {
    format_err!("No active coupon for code {}", code)
        .context(Error::NotFound("Invalid or expired coupon".to_string()))
        .into()
}

fn total_limit_error(coupon: &Coupon) -> FailureError {
    format_err!("Total usage limit of coupon {} exhausted", coupon.id)
        .context(Error::InvalidRequest(
            "Coupon has reached its total usage limit".to_string(),
        )).into()
}

/// Computes the discount of `coupon` over `cart`.
///
/// Pure: no I/O, no mutation of inputs, no rounding - amounts are
/// rounded at the response boundary only.
pub fn calculate_discount(coupon: &Coupon, cart: &CartSnapshot) -> Result<DiscountResult, FailureError> {
    match coupon.discount {
        DiscountSpec::Percentage {
            value,
            min_order_amount,
            max_discount_amount,
            max_word_count,
        } => {
            if value >= 100.0 {
                return calculate_full_discount(cart, max_word_count);
            }
            check_min_order_amount(cart, min_order_amount)?;
            let discount = cap_discount(cart.total_price * value / 100.0, max_discount_amount);
            Ok(DiscountResult {
                discount,
                discounted_total: subtract_discount(cart.total_price, discount),
                applied_to: None,
            })
        }
        DiscountSpec::Flat { value, min_order_amount } => {
            check_min_order_amount(cart, min_order_amount)?;
            // Flat discounts are never capped.
            let discount = value;
            Ok(DiscountResult {
                discount,
                discounted_total: subtract_discount(cart.total_price, discount),
                applied_to: None,
            })
        }
        DiscountSpec::ProductSpecific { product, value } => {
            let line = cart
                .products
                .iter()
                .find(|line| line.product == product)
                .ok_or_else(|| {
                    FailureError::from(Error::InvalidRequest(
                        "Product required for this coupon not found in cart".to_string(),
                    ))
                })?;
            let discount = line.total_price * value / 100.0;
            Ok(DiscountResult {
                discount,
                discounted_total: subtract_discount(cart.total_price, discount),
                applied_to: Some(product),
            })
        }
        DiscountSpec::QuantityBased {
            value,
            min_quantity,
            max_discount_amount,
        } => {
            if !cart.products.iter().any(|line| line.quantity >= min_quantity) {
                return Err(Error::InvalidRequest(format!("Minimum quantity of {} required", min_quantity)).into());
            }
            let discount = cap_discount(cart.total_price * value / 100.0, max_discount_amount);
            Ok(DiscountResult {
                discount,
                discounted_total: subtract_discount(cart.total_price, discount),
                applied_to: None,
            })
        }
    }
}

/// The 100%-off special case: one qualifying single-quantity line
/// becomes free, the rest of the cart pays full price.
fn calculate_full_discount(cart: &CartSnapshot, max_word_count: Option<i32>) -> Result<DiscountResult, FailureError> {
    let qualifying = cart.products.iter().filter(|line| match (line.word_count, max_word_count) {
        (Some(words), Some(limit)) => words <= limit,
        _ => true,
    });

    // Cheapest qualifying line; ties keep the first occurrence.
    let mut cheapest: Option<&CartProduct> = None;
    for line in qualifying {
        let replace = match cheapest {
            Some(current) => line.total_price < current.total_price,
            None => true,
        };
        if replace {
            cheapest = Some(line);
        }
    }

    let line = match cheapest {
        Some(line) => line,
        None => {
            let message = match max_word_count {
                Some(limit) if !cart.products.is_empty() => {
                    format!("No items qualify for this coupon (maximum word count {} exceeded)", limit)
                }
                _ => "No items qualify for this coupon".to_string(),
            };
            return Err(Error::InvalidRequest(message).into());
        }
    };

    if line.quantity != 1 {
        return Err(Error::InvalidRequest("This coupon applies to single-item purchases only".to_string()).into());
    }

    Ok(DiscountResult {
        discount: line.total_price,
        discounted_total: cart.total_price - line.total_price,
        applied_to: Some(line.product),
    })
}

fn check_min_order_amount(cart: &CartSnapshot, min_order_amount: f64) -> Result<(), FailureError> {
    if cart.total_price < min_order_amount {
        Err(Error::InvalidRequest("Minimum order amount not met".to_string()).into())
    } else {
        Ok(())
    }
}

fn cap_discount(discount: f64, max_discount_amount: Option<f64>) -> f64 {
    match max_discount_amount {
        Some(cap) if discount > cap => cap,
        _ => discount,
    }
}

fn subtract_discount(total: f64, discount: f64) -> f64 {
    (total - discount).max(0.0)
}
