//! Payment HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};

use super::dto::*;
use crate::application::{BookingService, InitiatePayment, PaymentService};
use crate::domain::PaymentMethod;
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppError, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct PaymentAppState {
    pub payments: Arc<PaymentService>,
    pub bookings: Arc<BookingService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "Payments",
    security(("user_id" = [])),
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, description = "Payment initiated", body = ApiResponse<PaymentOutcomeResponse>),
        (status = 400, description = "Invalid amount or method"),
        (status = 403, description = "Booking belongs to another user"),
        (status = 409, description = "Booking is not awaiting payment"),
        (status = 502, description = "Provider declined or unavailable")
    )
)]
pub async fn initiate_payment(
    State(state): State<PaymentAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<InitiatePaymentRequest>,
) -> ApiResult<PaymentOutcomeResponse> {
    let method = PaymentMethod::from_str(&req.method.to_ascii_uppercase())
        .ok_or_else(|| AppError::BadRequest(format!("Unknown payment method: {}", req.method)))?;

    let booking = state.bookings.get_booking(&req.booking_id).await?;
    if !user.can_access(&booking.user_id) {
        return Err(AppError::Forbidden("Not your booking".to_string()));
    }

    let outcome = state
        .payments
        .initiate_payment(InitiatePayment {
            booking_id: req.booking_id,
            amount: req.amount,
            method,
            phone_number: req.phone_number,
            return_url: req.return_url,
        })
        .await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "Payments",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment with its booking", body = ApiResponse<PaymentDetailsResponse>),
        (status = 403, description = "Payment belongs to another user"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_payment(
    State(state): State<PaymentAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<PaymentDetailsResponse> {
    let details = state.payments.get_payment_status(&id).await?;
    if !user.can_access(&details.payment.user_id) {
        return Err(AppError::Forbidden("Not your payment".to_string()));
    }
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/confirm-cash",
    tag = "Payments",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Cash payment completed, booking confirmed", body = ApiResponse<PaymentDto>),
        (status = 400, description = "Not a cash payment"),
        (status = 403, description = "Attendant or admin role required")
    )
)]
pub async fn confirm_cash_payment(
    State(state): State<PaymentAppState>,
    Extension(attendant): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<PaymentDto> {
    let payment = state
        .payments
        .confirm_cash_payment(&id, &attendant.user_id)
        .await?;
    Ok(Json(ApiResponse::success(payment.into())))
}
