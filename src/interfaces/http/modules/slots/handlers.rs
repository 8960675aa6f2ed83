//! Slot HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use super::dto::*;
use crate::domain::{DomainError, RepositoryProvider, SlotStatus};
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppError};

#[derive(Clone)]
pub struct SlotAppState {
    pub repos: Arc<dyn RepositoryProvider>,
}

#[utoipa::path(
    get,
    path = "/api/v1/slots",
    tag = "Slots",
    params(SlotListQuery),
    responses(
        (status = 200, description = "Slots with their ledger status", body = ApiResponse<Vec<SlotDto>>),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_slots(
    State(state): State<SlotAppState>,
    Query(query): Query<SlotListQuery>,
) -> ApiResult<Vec<SlotDto>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            SlotStatus::from_str(&s.to_ascii_uppercase())
                .ok_or_else(|| AppError::BadRequest(format!("Unknown slot status: {s}")))?,
        ),
        None => None,
    };

    let slots = state.repos.slots().find_all(query.location_id.as_deref()).await?;
    let slots = slots
        .into_iter()
        .filter(|s| status.map_or(true, |wanted| s.status == wanted))
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(slots)))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    params(("id" = String, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot details", body = ApiResponse<SlotDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_slot(
    State(state): State<SlotAppState>,
    Path(id): Path<String>,
) -> ApiResult<SlotDto> {
    let slot = state
        .repos
        .slots()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", &id))?;
    Ok(Json(ApiResponse::success(slot.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    tag = "Slots",
    responses(
        (status = 200, description = "Parking locations", body = ApiResponse<Vec<LocationDto>>)
    )
)]
pub async fn list_locations(State(state): State<SlotAppState>) -> ApiResult<Vec<LocationDto>> {
    let locations = state.repos.locations().find_all().await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(Into::into).collect(),
    )))
}
