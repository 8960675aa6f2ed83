//! Booking repository interface

use async_trait::async_trait;

use super::model::{Booking, BookingStatus};
use crate::domain::payment::Payment;
use crate::domain::slot::SlotStatus;
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomically insert a new booking and mark its slot RESERVED.
    ///
    /// Re-validates inside the write that the slot is still AVAILABLE and that
    /// no holding booking overlaps the interval; fails with `Conflict` otherwise.
    async fn reserve(&self, booking: Booking) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>>;

    async fn find_by_qr_code(&self, qr_code: &str) -> DomainResult<Option<Booking>>;

    /// Newest booking still holding a slot with this check-in code
    async fn find_by_check_in_code(&self, code: &str) -> DomainResult<Option<Booking>>;

    /// Bookings of one user, newest first
    async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>>;

    /// Bookings on a slot that are PENDING, CONFIRMED or ACTIVE
    async fn find_holding_for_slot(&self, slot_id: &str) -> DomainResult<Vec<Booking>>;

    async fn find_by_statuses(&self, statuses: &[BookingStatus]) -> DomainResult<Vec<Booking>>;

    /// Persist booking fields without touching the slot
    async fn update(&self, booking: Booking) -> DomainResult<()>;

    /// Persist the booking and set its slot's status in one transaction
    async fn update_with_slot(&self, booking: Booking, slot_status: SlotStatus) -> DomainResult<()>;

    /// Persist a cancelled booking, free its slot and store the refunded
    /// payment, all in one transaction. Nothing is written on failure.
    async fn cancel_with_refund(&self, booking: Booking, refunded: Option<Payment>) -> DomainResult<()>;
}
