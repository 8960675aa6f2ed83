//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::dto::*;
use crate::application::{BookingService, CreateBooking};
use crate::domain::BookingStatus;
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppError, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct BookingAppState {
    pub bookings: Arc<BookingService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("user_id" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created (PENDING, slot RESERVED)", body = ApiResponse<BookingDto>),
        (status = 400, description = "Invalid interval or amount"),
        (status = 404, description = "Slot not found"),
        (status = 409, description = "Slot not available or interval taken")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), AppError> {
    let booking = state
        .bookings
        .create_booking(CreateBooking {
            user_id: user.user_id,
            slot_id: req.slot_id,
            start_time: req.start_time,
            end_time: req.end_time,
            total_amount: req.total_amount,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("user_id" = [])),
    params(BookingListQuery),
    responses(
        (status = 200, description = "Caller's bookings, newest first", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_bookings(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<BookingListQuery>,
) -> ApiResult<Vec<BookingDto>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::from_str(&s.to_ascii_uppercase())
                .ok_or_else(|| AppError::BadRequest(format!("Unknown booking status: {s}")))?,
        ),
        None => None,
    };
    let bookings = state.bookings.get_user_bookings(&user.user_id, status).await?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingDto>),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<BookingDto> {
    let booking = state.bookings.get_booking(&id).await?;
    if !user.can_access(&booking.user_id) {
        return Err(AppError::Forbidden("Not your booking".to_string()));
    }
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/extend",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    request_body = ExtendBookingRequest,
    responses(
        (status = 200, description = "Booking extended", body = ApiResponse<ExtensionResponse>),
        (status = 403, description = "Booking belongs to another user"),
        (status = 409, description = "Slot booked by someone else or booking not extendable")
    )
)]
pub async fn extend_booking(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ExtendBookingRequest>,
) -> ApiResult<ExtensionResponse> {
    let booking = state.bookings.get_booking(&id).await?;
    if !user.can_access(&booking.user_id) {
        return Err(AppError::Forbidden("Not your booking".to_string()));
    }
    let result = state.bookings.extend_booking(&id, req.additional_hours).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<CancellationResponse>),
        (status = 403, description = "Only the owner may cancel"),
        (status = 409, description = "Booking can no longer be cancelled")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<CancellationResponse> {
    let result = state.bookings.cancel_booking(&id, &user.user_id).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/checkout",
    tag = "Bookings",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Checked out; overtime included", body = ApiResponse<CheckOutResponse>),
        (status = 403, description = "Attendant or admin role required"),
        (status = 409, description = "Booking is not active")
    )
)]
pub async fn check_out(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> ApiResult<CheckOutResponse> {
    let result = state.bookings.check_out(&id).await?;
    Ok(Json(ApiResponse::success(result.into())))
}
