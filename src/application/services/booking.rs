//! Booking lifecycle service
//!
//! Owns every booking state transition and keeps the slot ledger in step
//! with it. Each mutating operation takes the slot's lock, re-reads the
//! booking under it, applies the domain transition, and persists booking and
//! slot status together.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use super::codes::CodeGenerator;
use super::slot_locks::SlotLocks;
use crate::application::ports::NotificationSink;
use crate::domain::{
    Booking, BookingPolicy, BookingStatus, BookingUpdate, CheckOutSummary, DomainError,
    DomainResult, Notification, NotificationCategory, NotificationPriority, ParkingSlot, Payment,
    PaymentStatus, RepositoryProvider, SlotStatus,
};

const MAX_CHECK_IN_CODE_ATTEMPTS: usize = 10;

/// Request to reserve a slot
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub user_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Quoted amount in the smallest currency unit
    pub total_amount: i64,
}

/// What the attendant sees after a successful check-in
#[derive(Debug, Clone)]
pub struct CheckInDetails {
    pub booking: Booking,
    pub location_name: String,
    pub slot_number: String,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CheckOutResult {
    pub booking: Booking,
    pub summary: CheckOutSummary,
}

#[derive(Debug, Clone)]
pub struct ExtensionResult {
    pub booking: Booking,
    pub additional_amount: i64,
    pub new_end_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CancellationResult {
    pub booking: Booking,
    pub refund_amount: i64,
    /// Whether a completed payment was marked REFUNDED
    pub payment_refunded: bool,
}

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    codes: Arc<CodeGenerator>,
    notifier: Arc<dyn NotificationSink>,
    policy: BookingPolicy,
    slot_locks: SlotLocks,
}

impl BookingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        codes: Arc<CodeGenerator>,
        notifier: Arc<dyn NotificationSink>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            repos,
            codes,
            notifier,
            policy,
            slot_locks: SlotLocks::new(),
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub fn codes(&self) -> &CodeGenerator {
        &self.codes
    }

    // ── Create ──────────────────────────────────────────────────

    pub async fn create_booking(&self, request: CreateBooking) -> DomainResult<Booking> {
        if request.start_time >= request.end_time {
            return Err(DomainError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }
        if request.total_amount < 0 {
            return Err(DomainError::Validation(
                "total_amount must not be negative".to_string(),
            ));
        }

        // only slots that exist get a lock entry
        let slot = self.find_slot(&request.slot_id).await?;
        let _guard = self.slot_locks.acquire(&slot.id).await;

        let slot = self.find_slot(&slot.id).await?;
        if !slot.is_available() {
            return Err(DomainError::Conflict(format!(
                "Parking slot {} is not available (status: {})",
                slot.slot_number, slot.status
            )));
        }

        let holding = self
            .repos
            .bookings()
            .find_holding_for_slot(&slot.id)
            .await?;
        if holding
            .iter()
            .any(|b| b.overlaps(request.start_time, request.end_time))
        {
            return Err(DomainError::Conflict(
                "Slot is already booked for the selected time".to_string(),
            ));
        }

        let qr_code = self.codes.generate_qr_code();
        let check_in_code = self.unique_check_in_code().await?;

        let booking = Booking::new(
            request.user_id,
            slot.id.clone(),
            request.start_time,
            request.end_time,
            request.total_amount,
            qr_code,
            check_in_code,
        );
        self.repos.bookings().reserve(booking.clone()).await?;

        metrics::counter!("booking_transitions_total", "to" => "PENDING").increment(1);
        info!(
            booking_id = %booking.id,
            slot_id = %booking.slot_id,
            user_id = %booking.user_id,
            total_amount = booking.total_amount,
            "Booking created"
        );

        self.notify(BookingUpdate::Created.notification(&booking.user_id, &booking.id))
            .await;
        Ok(booking)
    }

    async fn unique_check_in_code(&self) -> DomainResult<String> {
        for _ in 0..MAX_CHECK_IN_CODE_ATTEMPTS {
            let code = self.codes.generate_check_in_code();
            if self
                .repos
                .bookings()
                .find_by_check_in_code(&code)
                .await?
                .is_none()
            {
                return Ok(code);
            }
        }
        Err(DomainError::Conflict(
            "Could not allocate a unique check-in code".to_string(),
        ))
    }

    // ── Confirm ─────────────────────────────────────────────────

    /// The only path from PENDING to CONFIRMED. `payment_id` must name a
    /// COMPLETED payment of this booking that covers its total; confirming
    /// twice is a no-op.
    pub async fn confirm_booking_payment(&self, booking_id: &str, payment_id: &str) -> DomainResult<Booking> {
        self.confirm_booking_payment_at(booking_id, payment_id, Utc::now())
            .await
    }

    pub async fn confirm_booking_payment_at(
        &self,
        booking_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let (_guard, mut booking) = self.load_locked(booking_id).await?;

        if booking.status == BookingStatus::Confirmed {
            debug!(booking_id, "Booking already confirmed");
            return Ok(booking);
        }

        let payment = self
            .repos
            .payments()
            .find_by_id(payment_id)
            .await?
            .filter(|p| p.booking_id == booking.id)
            .ok_or_else(|| DomainError::not_found("Payment", "id", payment_id))?;
        if payment.status != PaymentStatus::Completed {
            return Err(DomainError::InvalidState(format!(
                "Payment {} for booking {} is not completed",
                payment.id, booking_id
            )));
        }
        if payment.amount < booking.total_amount {
            return Err(DomainError::Validation(format!(
                "Payment {} of {} does not cover booking total {}",
                payment.id, payment.amount, booking.total_amount
            )));
        }

        booking.confirm(now)?;
        self.repos.bookings().update(booking.clone()).await?;

        metrics::counter!("booking_transitions_total", "to" => "CONFIRMED").increment(1);
        info!(booking_id, payment_id, "Booking confirmed");

        self.notify(Notification::new(
            &booking.user_id,
            "Payment Confirmed",
            "Your payment has been confirmed and booking is active",
            NotificationCategory::Payment,
            NotificationPriority::Normal,
            serde_json::json!({ "bookingId": booking.id }),
        ))
        .await;
        Ok(booking)
    }

    // ── Check-in / check-out ────────────────────────────────────

    /// Check in by QR payload, or by the 6-digit check-in code.
    pub async fn check_in(
        &self,
        code: &str,
        attendant_id: Option<&str>,
    ) -> DomainResult<CheckInDetails> {
        self.check_in_at(code, attendant_id, Utc::now()).await
    }

    pub async fn check_in_at(
        &self,
        code: &str,
        attendant_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<CheckInDetails> {
        let found = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "code", code))?;

        let (_guard, mut booking) = self.load_locked(&found.id).await?;
        let slot = self.find_slot(&booking.slot_id).await?;
        let location = self
            .repos
            .locations()
            .find_by_id(&slot.location_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingLocation", "id", &slot.location_id))?;

        booking.check_in(now, self.policy.check_in_grace)?;
        self.repos
            .bookings()
            .update_with_slot(booking.clone(), SlotStatus::Occupied)
            .await?;

        metrics::counter!("booking_transitions_total", "to" => "ACTIVE").increment(1);
        info!(
            booking_id = %booking.id,
            slot_id = %slot.id,
            attendant = attendant_id.unwrap_or("self-service"),
            "Booking checked in"
        );

        self.notify(BookingUpdate::CheckInSuccess.notification(&booking.user_id, &booking.id))
            .await;

        Ok(CheckInDetails {
            end_time: booking.end_time,
            booking,
            location_name: location.name,
            slot_number: slot.slot_number,
        })
    }

    pub async fn check_out(&self, booking_id: &str) -> DomainResult<CheckOutResult> {
        self.check_out_at(booking_id, Utc::now()).await
    }

    /// Completes the booking and frees the slot. Overtime is added to the
    /// total and announced to the user; it is not charged automatically.
    pub async fn check_out_at(
        &self,
        booking_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<CheckOutResult> {
        let (_guard, mut booking) = self.load_locked(booking_id).await?;
        let slot = self.find_slot(&booking.slot_id).await?;

        let summary = booking.check_out(now, slot.base_price)?;
        self.repos
            .bookings()
            .update_with_slot(booking.clone(), SlotStatus::Available)
            .await?;

        metrics::counter!("booking_transitions_total", "to" => "COMPLETED").increment(1);
        info!(
            booking_id,
            additional_charges = summary.additional_charges,
            duration_minutes = summary.duration_minutes,
            "Booking checked out"
        );

        let update = if summary.additional_charges > 0 {
            BookingUpdate::AdditionalPaymentRequired
        } else {
            BookingUpdate::CheckOutSuccess
        };
        self.notify(update.notification(&booking.user_id, &booking.id))
            .await;

        Ok(CheckOutResult { booking, summary })
    }

    // ── Extend / cancel ─────────────────────────────────────────

    pub async fn extend_booking(
        &self,
        booking_id: &str,
        additional_hours: i64,
    ) -> DomainResult<ExtensionResult> {
        self.extend_booking_at(booking_id, additional_hours, Utc::now())
            .await
    }

    /// Only bookings that occupy the new window `[end, end + hours)` block an
    /// extension; a booking starting exactly at the new end does not.
    pub async fn extend_booking_at(
        &self,
        booking_id: &str,
        additional_hours: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<ExtensionResult> {
        let (_guard, booking) = self.load_locked(booking_id).await?;
        let slot = self.find_slot(&booking.slot_id).await?;

        let mut extended = booking.clone();
        let additional_amount = extended.extend(additional_hours, slot.base_price, now)?;

        let others = self
            .repos
            .bookings()
            .find_holding_for_slot(&booking.slot_id)
            .await?;
        if others
            .iter()
            .filter(|b| b.id != booking.id)
            .any(|b| b.blocks_extension(booking.end_time, extended.end_time))
        {
            return Err(DomainError::Conflict(
                "Cannot extend - slot is booked by another user".to_string(),
            ));
        }

        self.repos.bookings().update(extended.clone()).await?;

        info!(
            booking_id,
            additional_hours,
            additional_amount,
            new_end_time = %extended.end_time,
            "Booking extended"
        );
        self.notify(BookingUpdate::Extended.notification(&extended.user_id, &extended.id))
            .await;

        Ok(ExtensionResult {
            new_end_time: extended.end_time,
            booking: extended,
            additional_amount,
        })
    }

    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        requester_id: &str,
    ) -> DomainResult<CancellationResult> {
        self.cancel_booking_at(booking_id, requester_id, Utc::now())
            .await
    }

    pub async fn cancel_booking_at(
        &self,
        booking_id: &str,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<CancellationResult> {
        let (_guard, mut booking) = self.load_locked(booking_id).await?;

        let refund_amount = booking.cancel(requester_id, now, &self.policy)?;
        let refunded = if refund_amount > 0 {
            self.refundable_payment(booking_id, now).await?
        } else {
            None
        };
        let payment_refunded = refunded.is_some();

        self.repos
            .bookings()
            .cancel_with_refund(booking.clone(), refunded)
            .await?;

        metrics::counter!("booking_transitions_total", "to" => "CANCELLED").increment(1);
        info!(booking_id, refund_amount, payment_refunded, "Booking cancelled");

        self.notify(BookingUpdate::Cancelled.notification(&booking.user_id, &booking.id))
            .await;

        Ok(CancellationResult {
            booking,
            refund_amount,
            payment_refunded,
        })
    }

    /// The booking's completed payment, already moved to REFUNDED
    async fn refundable_payment(&self, booking_id: &str, now: DateTime<Utc>) -> DomainResult<Option<Payment>> {
        let completed = self
            .repos
            .payments()
            .find_by_booking(booking_id)
            .await?
            .into_iter()
            .find(|p| p.status == PaymentStatus::Completed);

        match completed {
            Some(mut payment) => {
                payment.refund(now)?;
                Ok(Some(payment))
            }
            None => Ok(None),
        }
    }

    // ── Expiry ──────────────────────────────────────────────────

    /// Expire PENDING/CONFIRMED bookings whose check-in window has closed
    /// and free their slots. Returns how many bookings expired.
    pub async fn expire_overdue_bookings(&self) -> DomainResult<usize> {
        self.expire_overdue_bookings_at(Utc::now()).await
    }

    pub async fn expire_overdue_bookings_at(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let grace = self.policy.check_in_grace;
        let candidates = self
            .repos
            .bookings()
            .find_by_statuses(&[BookingStatus::Pending, BookingStatus::Confirmed])
            .await?;

        let mut expired = 0;
        for candidate in candidates.into_iter().filter(|b| b.is_overdue(now, grace)) {
            match self.expire_one(&candidate.id, now, grace).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => warn!(booking_id = %candidate.id, error = %e, "Failed to expire booking"),
            }
        }

        if expired > 0 {
            info!(count = expired, "Expired overdue bookings");
        }
        Ok(expired)
    }

    async fn expire_one(&self, booking_id: &str, now: DateTime<Utc>, grace: Duration) -> DomainResult<bool> {
        let (_guard, mut booking) = self.load_locked(booking_id).await?;
        if !booking.is_overdue(now, grace) {
            return Ok(false);
        }

        booking.expire(now)?;
        self.repos
            .bookings()
            .update_with_slot(booking.clone(), SlotStatus::Available)
            .await?;

        metrics::counter!("booking_transitions_total", "to" => "EXPIRED").increment(1);
        self.notify(BookingUpdate::Expired.notification(&booking.user_id, &booking.id))
            .await;
        Ok(true)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get_booking(&self, booking_id: &str) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", booking_id))
    }

    pub async fn get_user_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        self.repos.bookings().find_by_user(user_id, status).await
    }

    /// QR payload first, then the manual check-in code
    pub async fn find_by_code(&self, code: &str) -> DomainResult<Option<Booking>> {
        if let Some(booking) = self.repos.bookings().find_by_qr_code(code).await? {
            return Ok(Some(booking));
        }
        self.repos.bookings().find_by_check_in_code(code).await
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn find_slot(&self, slot_id: &str) -> DomainResult<ParkingSlot> {
        self.repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", slot_id))
    }

    /// Lock the booking's slot and return a fresh copy of the booking.
    async fn load_locked(&self, booking_id: &str) -> DomainResult<(OwnedMutexGuard<()>, Booking)> {
        let booking = self.get_booking(booking_id).await?;
        let guard = self.slot_locks.acquire(&booking.slot_id).await;
        let booking = self.get_booking(booking_id).await?;
        Ok((guard, booking))
    }

    async fn notify(&self, notification: Notification) {
        let user_id = notification.user_id.clone();
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(user_id = %user_id, error = %e, "Notification delivery failed");
        }
    }
}
