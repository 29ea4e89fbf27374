use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{Coupon, Money},
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CouponQuoteRequest {
    pub code: String,
    /// Order subtotal in minor currency units.
    pub order_amount: Money,
}

/// Validation verdict. Rejections carry the reason instead of failing the request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CouponValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppliedCouponResponse {
    pub coupon_id: Uuid,
    pub discount_amount: Money,
}

/// Check whether a coupon can be used on an order of the given amount
#[utoipa::path(
    post,
    path = "/api/v1/coupons/validate",
    request_body = CouponQuoteRequest,
    responses(
        (status = 200, description = "Validation verdict, including rejections", body = CouponValidationResponse)
    ),
    tag = "coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CouponQuoteRequest>,
) -> Result<Json<ApiResponse<CouponValidationResponse>>, ServiceError> {
    let verdict = match state
        .services
        .coupons
        .validate(&payload.code, payload.order_amount)
        .await
    {
        Ok(coupon) => CouponValidationResponse {
            valid: true,
            coupon: Some(coupon),
            reason: None,
            code: None,
        },
        Err(rejection) if rejection.is_user_facing() => {
            debug!("Coupon {} rejected: {}", payload.code, rejection);
            CouponValidationResponse {
                valid: false,
                coupon: None,
                reason: Some(rejection.response_message()),
                code: Some(rejection.code().to_string()),
            }
        }
        Err(e) => return Err(e),
    };

    Ok(Json(ApiResponse::success(verdict)))
}

/// Quote the discount a coupon grants without redeeming it
#[utoipa::path(
    post,
    path = "/api/v1/coupons/apply",
    request_body = CouponQuoteRequest,
    responses(
        (status = 200, description = "Discount quote", body = AppliedCouponResponse),
        (status = 400, description = "Blank coupon code", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown coupon", body = crate::errors::ErrorResponse),
        (status = 422, description = "Coupon expired or order below minimum", body = crate::errors::ErrorResponse)
    ),
    tag = "coupons"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CouponQuoteRequest>,
) -> Result<Json<ApiResponse<AppliedCouponResponse>>, ServiceError> {
    let applied = state
        .services
        .coupons
        .apply(&payload.code, payload.order_amount)
        .await?;

    Ok(Json(ApiResponse::success(AppliedCouponResponse {
        coupon_id: applied.coupon_id(),
        discount_amount: applied.discount_amount,
    })))
}
