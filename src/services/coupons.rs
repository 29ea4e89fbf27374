use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::bounded;
use crate::{
    clock::Clock,
    errors::ServiceError,
    models::{AppliedCoupon, Coupon, DiscountType, Money},
    repositories::CheckoutStore,
};

/// Checks that `coupon` may be used at `now` on an order of `order_amount`.
///
/// Inactive coupons, coupons outside `[valid_from, valid_to]` (both ends
/// inclusive) and coupons that used up their limit are all reported as
/// expired; the minimum order value is checked last.
pub fn check_coupon(
    coupon: &Coupon,
    order_amount: Money,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if !coupon.is_active {
        return Err(ServiceError::CouponExpired(format!(
            "Coupon {} is no longer active",
            coupon.code
        )));
    }
    if !coupon.is_within_window(now) {
        return Err(ServiceError::CouponExpired(format!(
            "Coupon {} is only valid from {} to {}",
            coupon.code,
            coupon.valid_from.to_rfc3339(),
            coupon.valid_to.to_rfc3339()
        )));
    }
    if !coupon.has_remaining_uses() {
        return Err(ServiceError::CouponExpired(format!(
            "Coupon {} has reached its usage limit",
            coupon.code
        )));
    }
    if order_amount < coupon.min_order_value {
        return Err(ServiceError::BelowMinimum {
            minimum: coupon.min_order_value,
            shortfall: coupon.min_order_value - order_amount,
        });
    }
    Ok(())
}

/// Discount `coupon` grants on `order_amount`. Never exceeds the order amount.
pub fn calculate_discount(coupon: &Coupon, order_amount: Money) -> Money {
    let order_amount = order_amount.non_negative();
    let discount = match coupon.discount_type {
        DiscountType::Fixed => Money::new(coupon.discount_value),
        DiscountType::Percentage => {
            let raw = order_amount.ratio(coupon.discount_value, 100);
            match coupon.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
    };

    discount.non_negative().min(order_amount)
}

/// Validates and quotes discount codes.
///
/// Nothing here touches the usage counter: quoting a coupon any number of
/// times leaves its budget intact. Redemption belongs to order assembly.
#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn CheckoutStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl CouponService {
    pub fn new(store: Arc<dyn CheckoutStore>, clock: Arc<dyn Clock>, store_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            store_timeout,
        }
    }

    /// Validates `code` for an order of `order_amount` at the current time.
    pub async fn validate(&self, code: &str, order_amount: Money) -> Result<Coupon, ServiceError> {
        self.validate_at(code, order_amount, self.clock.now()).await
    }

    /// Codes are compared case-sensitively after trimming surrounding whitespace.
    #[instrument(skip(self), fields(order_amount = %order_amount))]
    pub async fn validate_at(
        &self,
        code: &str,
        order_amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Coupon, ServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::InvalidInput("Coupon code is required".into()));
        }

        let lookup = bounded(
            self.store_timeout,
            "coupon lookup",
            self.store.get_coupon_by_code(code),
        )
        .await;

        let coupon = match lookup {
            Ok(Some(coupon)) => coupon,
            Ok(None) => {
                debug!("No coupon with code {}", code);
                return Err(ServiceError::NotFound(format!("Coupon {} not found", code)));
            }
            Err(e) => {
                error!("Coupon lookup for {} failed: {}", code, e);
                return Err(ServiceError::NotFound(format!("Coupon {} not found", code)));
            }
        };

        if let Err(rejection) = check_coupon(&coupon, order_amount, now) {
            debug!("Coupon {} rejected: {}", code, rejection);
            return Err(rejection);
        }

        Ok(coupon)
    }

    /// Validates `code` and computes the discount it grants on `order_amount`.
    pub async fn apply(&self, code: &str, order_amount: Money) -> Result<AppliedCoupon, ServiceError> {
        self.apply_at(code, order_amount, self.clock.now()).await
    }

    pub async fn apply_at(
        &self,
        code: &str,
        order_amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, ServiceError> {
        let coupon = self.validate_at(code, order_amount, now).await?;
        let discount_amount = calculate_discount(&coupon, order_amount);

        Ok(AppliedCoupon {
            coupon,
            discount_amount,
        })
    }
}
