//! Check-in DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::CheckInDetails;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckInRequest {
    /// Scanned QR payload or the 6-digit check-in code
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub booking_id: String,
    pub user_id: String,
    pub status: String,
    pub location_name: String,
    pub slot_number: String,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
}

impl From<CheckInDetails> for CheckInResponse {
    fn from(d: CheckInDetails) -> Self {
        Self {
            booking_id: d.booking.id,
            user_id: d.booking.user_id,
            status: d.booking.status.as_str().to_string(),
            location_name: d.location_name,
            slot_number: d.slot_number,
            checked_in_at: d.booking.actual_start_time,
            end_time: d.end_time,
        }
    }
}
