use axum::{response::Json, routing::get, Router};
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Checkout API",
        version = "0.1.0",
        description = r#"
Checkout core of the storefront: coupon quotes, order placement and the
order and payment lifecycle.

All amounts are integers in the smallest currency unit. Failed requests
return:

```json
{
  "success": false,
  "error": "Unprocessable Entity",
  "code": "below_minimum",
  "message": "Order amount is below the coupon minimum of 100000 (short by 1000)",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
"#
    ),
    paths(
        crate::handlers::health::health_check,
        crate::handlers::coupons::validate_coupon,
        crate::handlers::coupons::apply_coupon,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::payments::update_payment_status,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::models::Money,
        crate::models::Coupon,
        crate::models::DiscountType,
        crate::models::LineItem,
        crate::models::OrderDraft,
        crate::models::Recipient,
        crate::models::Order,
        crate::models::OrderItem,
        crate::models::OrderStatus,
        crate::models::HydratedOrder,
        crate::models::Payment,
        crate::models::PaymentStatus,
        crate::models::ShippingMethod,
        crate::handlers::coupons::CouponQuoteRequest,
        crate::handlers::coupons::CouponValidationResponse,
        crate::handlers::coupons::AppliedCouponResponse,
        crate::handlers::orders::CreateOrderRequest,
        crate::handlers::orders::UpdateOrderStatusRequest,
        crate::handlers::payments::UpdatePaymentStatusRequest,
        crate::handlers::health::HealthStatus,
        crate::services::payments::PaymentStatusUpdate,
        crate::services::payments::OrderStatusChange,
    )),
    tags(
        (name = "coupons", description = "Coupon validation and quotes"),
        (name = "orders", description = "Order placement and status"),
        (name = "payments", description = "Payment status updates"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_checkout_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/orders"));
        assert!(doc.paths.paths.contains_key("/api/v1/payments/{id}/status"));
    }
}
