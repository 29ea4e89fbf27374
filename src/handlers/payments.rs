use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError, services::payments::PaymentStatusUpdate, ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    /// One of Pending, Completed, Failed.
    pub status: String,
    pub transaction_id: Option<String>,
}

/// Record a payment status reported by the payment provider
#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}/status",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment updated", body = PaymentStatusUpdate),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Payment or order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order cannot move to Processing", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<ApiResponse<PaymentStatusUpdate>>, ServiceError> {
    let update = state
        .services
        .payments
        .update_payment_status(id, &payload.status, payload.transaction_id)
        .await?;

    Ok(Json(ApiResponse::success(update)))
}
