//! Check-in HTTP handler

use axum::extract::State;
use axum::{Extension, Json};

use super::dto::*;
use crate::interfaces::http::common::{ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::bookings::BookingAppState;

#[utoipa::path(
    post,
    path = "/api/v1/checkin",
    tag = "Check-in",
    security(("user_id" = [])),
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Booking is ACTIVE, slot OCCUPIED", body = ApiResponse<CheckInResponse>),
        (status = 403, description = "Attendant or admin role required"),
        (status = 404, description = "No booking for this code"),
        (status = 409, description = "Booking is not confirmed"),
        (status = 422, description = "Outside the check-in window")
    )
)]
pub async fn check_in(
    State(state): State<BookingAppState>,
    Extension(attendant): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<CheckInRequest>,
) -> ApiResult<CheckInResponse> {
    let details = state
        .bookings
        .check_in(req.code.trim(), Some(&attendant.user_id))
        .await?;
    Ok(Json(ApiResponse::success(details.into())))
}
