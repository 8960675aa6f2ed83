//! Booking DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{CancellationResult, CheckOutResult, ExtensionResult};
use crate::domain::Booking;

/// Request to reserve a slot
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, message = "slot_id is required"))]
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Quoted price in cents
    #[validate(range(min = 0, message = "total_amount must not be negative"))]
    pub total_amount: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExtendBookingRequest {
    #[validate(range(min = 1, max = 24, message = "additional_hours must be between 1 and 24"))]
    pub additional_hours: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingListQuery {
    /// PENDING, CONFIRMED, ACTIVE, COMPLETED, CANCELLED or EXPIRED
    pub status: Option<String>,
}

/// Booking details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDto {
    pub id: String,
    pub user_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Amount owed in cents
    pub total_amount: i64,
    pub status: String,
    pub qr_code: String,
    pub check_in_code: String,
    pub extended_times: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            slot_id: b.slot_id,
            start_time: b.start_time,
            end_time: b.end_time,
            actual_start_time: b.actual_start_time,
            actual_end_time: b.actual_end_time,
            total_amount: b.total_amount,
            status: b.status.as_str().to_string(),
            qr_code: b.qr_code,
            check_in_code: b.check_in_code,
            extended_times: b.extended_times,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtensionResponse {
    pub booking: BookingDto,
    pub additional_amount: i64,
    pub new_end_time: DateTime<Utc>,
}

impl From<ExtensionResult> for ExtensionResponse {
    fn from(r: ExtensionResult) -> Self {
        Self {
            booking: r.booking.into(),
            additional_amount: r.additional_amount,
            new_end_time: r.new_end_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancellationResponse {
    pub booking: BookingDto,
    pub refund_amount: i64,
    /// Whether a completed payment was marked REFUNDED
    pub payment_refunded: bool,
}

impl From<CancellationResult> for CancellationResponse {
    fn from(r: CancellationResult) -> Self {
        Self {
            booking: r.booking.into(),
            refund_amount: r.refund_amount,
            payment_refunded: r.payment_refunded,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckOutResponse {
    pub booking: BookingDto,
    /// Overtime charge in cents
    pub additional_charges: i64,
    pub total_amount: i64,
    pub duration_minutes: i64,
}

impl From<CheckOutResult> for CheckOutResponse {
    fn from(r: CheckOutResult) -> Self {
        Self {
            booking: r.booking.into(),
            additional_charges: r.summary.additional_charges,
            total_amount: r.summary.total_amount,
            duration_minutes: r.summary.duration_minutes,
        }
    }
}
