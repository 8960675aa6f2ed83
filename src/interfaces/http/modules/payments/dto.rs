//! Payment DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{PaymentDetails, PaymentOutcome};
use crate::domain::Payment;
use crate::interfaces::http::modules::bookings::BookingDto;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InitiatePaymentRequest {
    #[validate(length(min = 1, message = "booking_id is required"))]
    pub booking_id: String,
    /// Amount in cents
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
    /// TELEBIRR, CBE_BIRR, CHAPA or CASH
    pub method: String,
    #[validate(length(min = 9, max = 16, message = "phone_number looks invalid"))]
    pub phone_number: Option<String>,
    #[validate(url)]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentDto {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    pub amount: i64,
    pub method: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            booking_id: p.booking_id,
            user_id: p.user_id,
            amount: p.amount,
            method: p.method.as_str().to_string(),
            status: p.status.as_str().to_string(),
            transaction_id: p.transaction_id,
            paid_at: p.paid_at,
            refunded_at: p.refunded_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentOutcomeResponse {
    pub payment: PaymentDto,
    /// Hosted checkout page, for redirect-based providers
    pub payment_url: Option<String>,
    pub message: String,
}

impl From<PaymentOutcome> for PaymentOutcomeResponse {
    fn from(o: PaymentOutcome) -> Self {
        Self {
            payment: o.payment.into(),
            payment_url: o.payment_url,
            message: o.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentDetailsResponse {
    pub payment: PaymentDto,
    pub booking: BookingDto,
}

impl From<PaymentDetails> for PaymentDetailsResponse {
    fn from(d: PaymentDetails) -> Self {
        Self {
            payment: d.payment.into(),
            booking: d.booking.into(),
        }
    }
}
