//! User-facing notifications emitted by the booking core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    Booking,
    Payment,
    Expiry,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

/// A message for one user; delivery is best-effort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    /// Structured context, e.g. `{"bookingId": "...", "type": "CHECK_IN_SUCCESS"}`
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        category: NotificationCategory,
        priority: NotificationPriority,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            message: message.into(),
            category,
            priority,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Booking lifecycle updates sent to the booking owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingUpdate {
    Created,
    CheckInSuccess,
    CheckOutSuccess,
    AdditionalPaymentRequired,
    Extended,
    Cancelled,
    Expired,
}

impl BookingUpdate {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Created => "BOOKING_CREATED",
            Self::CheckInSuccess => "CHECK_IN_SUCCESS",
            Self::CheckOutSuccess => "CHECK_OUT_SUCCESS",
            Self::AdditionalPaymentRequired => "ADDITIONAL_PAYMENT_REQUIRED",
            Self::Extended => "BOOKING_EXTENDED",
            Self::Cancelled => "BOOKING_CANCELLED",
            Self::Expired => "BOOKING_EXPIRED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Created => "Your parking booking has been created successfully",
            Self::CheckInSuccess => "Check-in successful! Enjoy your parking",
            Self::CheckOutSuccess => "Check-out completed successfully",
            Self::AdditionalPaymentRequired => "Additional payment required for overtime",
            Self::Extended => "Your parking time has been extended",
            Self::Cancelled => "Your booking has been cancelled",
            Self::Expired => "Your booking expired without a check-in",
        }
    }

    pub fn priority(&self) -> NotificationPriority {
        match self {
            Self::AdditionalPaymentRequired => NotificationPriority::High,
            _ => NotificationPriority::Normal,
        }
    }

    pub fn notification(&self, user_id: &str, booking_id: &str) -> Notification {
        Notification::new(
            user_id,
            "Booking Update",
            self.message(),
            NotificationCategory::Booking,
            self.priority(),
            serde_json::json!({ "bookingId": booking_id, "type": self.code() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overtime_notice_is_high_priority() {
        let n = BookingUpdate::AdditionalPaymentRequired.notification("u1", "b1");
        assert_eq!(n.priority, NotificationPriority::High);
        assert_eq!(n.metadata["type"], "ADDITIONAL_PAYMENT_REQUIRED");
        assert_eq!(n.metadata["bookingId"], "b1");
    }

    #[test]
    fn category_serializes_upper_case() {
        let json = serde_json::to_value(NotificationCategory::Booking).unwrap();
        assert_eq!(json, "BOOKING");
    }
}
