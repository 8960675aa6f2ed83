//! In-memory repositories for development and testing

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::booking::BookingRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::slot::{LocationRepository, SlotRepository};
use crate::domain::{
    Booking, BookingStatus, DomainError, DomainResult, ParkingLocation, ParkingSlot, Payment,
    PaymentStatus, ProcessedWebhook, RepositoryProvider, SlotStatus,
};

/// Every repository backed by `DashMap`s.
///
/// Writes that touch a booking and its slot together run under `ledger`, so
/// they are atomic with respect to each other.
pub struct InMemoryRepositoryProvider {
    locations: DashMap<String, ParkingLocation>,
    slots: DashMap<String, ParkingSlot>,
    bookings: DashMap<String, Booking>,
    payments: DashMap<String, Payment>,
    webhooks: DashMap<(String, String), ProcessedWebhook>,
    ledger: Mutex<()>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            locations: DashMap::new(),
            slots: DashMap::new(),
            bookings: DashMap::new(),
            payments: DashMap::new(),
            webhooks: DashMap::new(),
            ledger: Mutex::new(()),
        }
    }

    fn lock_ledger(&self) -> DomainResult<std::sync::MutexGuard<'_, ()>> {
        self.ledger
            .lock()
            .map_err(|_| DomainError::Storage("ledger lock poisoned".to_string()))
    }

    fn set_slot_status(&self, slot_id: &str, status: SlotStatus) -> DomainResult<()> {
        let mut slot = self
            .slots
            .get_mut(slot_id)
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", slot_id))?;
        slot.status = status;
        slot.updated_at = Utc::now();
        Ok(())
    }

    fn replace_booking(&self, booking: Booking) -> DomainResult<()> {
        if !self.bookings.contains_key(&booking.id) {
            return Err(DomainError::not_found("Booking", "id", &booking.id));
        }
        self.bookings.insert(booking.id.clone(), booking);
        Ok(())
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn locations(&self) -> &dyn LocationRepository {
        self
    }

    fn slots(&self) -> &dyn SlotRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }

    fn payments(&self) -> &dyn PaymentRepository {
        self
    }
}

#[async_trait]
impl LocationRepository for InMemoryRepositoryProvider {
    async fn save(&self, location: ParkingLocation) -> DomainResult<()> {
        self.locations.insert(location.id.clone(), location);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingLocation>> {
        Ok(self.locations.get(id).map(|l| l.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLocation>> {
        let mut all: Vec<_> = self.locations.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

#[async_trait]
impl SlotRepository for InMemoryRepositoryProvider {
    async fn save(&self, slot: ParkingSlot) -> DomainResult<()> {
        self.slots.insert(slot.id.clone(), slot);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSlot>> {
        Ok(self.slots.get(id).map(|s| s.clone()))
    }

    async fn find_all(&self, location_id: Option<&str>) -> DomainResult<Vec<ParkingSlot>> {
        let mut all: Vec<_> = self
            .slots
            .iter()
            .filter(|e| location_id.map_or(true, |loc| e.location_id == loc))
            .map(|e| e.value().clone())
            .collect();
        all.sort_by(|a, b| a.slot_number.cmp(&b.slot_number));
        Ok(all)
    }

    async fn update_status(&self, id: &str, status: SlotStatus) -> DomainResult<()> {
        let _ledger = self.lock_ledger()?;
        self.set_slot_status(id, status)
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.slots.len() as u64)
    }
}

#[async_trait]
impl BookingRepository for InMemoryRepositoryProvider {
    async fn reserve(&self, booking: Booking) -> DomainResult<()> {
        let _ledger = self.lock_ledger()?;

        let available = self
            .slots
            .get(&booking.slot_id)
            .map(|s| s.is_available())
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", &booking.slot_id))?;
        if !available {
            return Err(DomainError::Conflict(format!(
                "Parking slot {} is not available",
                booking.slot_id
            )));
        }

        let overlapping = self.bookings.iter().any(|b| {
            b.slot_id == booking.slot_id
                && b.status.holds_slot()
                && b.overlaps(booking.start_time, booking.end_time)
        });
        if overlapping {
            return Err(DomainError::Conflict(
                "Slot is already booked for the selected time".to_string(),
            ));
        }

        self.set_slot_status(&booking.slot_id, SlotStatus::Reserved)?;
        self.bookings.insert(booking.id.clone(), booking);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(id).map(|b| b.clone()))
    }

    async fn find_by_qr_code(&self, qr_code: &str) -> DomainResult<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .find(|b| b.qr_code == qr_code)
            .map(|b| b.value().clone()))
    }

    async fn find_by_check_in_code(&self, code: &str) -> DomainResult<Option<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| b.check_in_code == code && b.status.holds_slot())
            .max_by_key(|b| b.created_at)
            .map(|b| b.value().clone()))
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        let mut found: Vec<_> = self
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && status.map_or(true, |s| b.status == s))
            .map(|b| b.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_holding_for_slot(&self, slot_id: &str) -> DomainResult<Vec<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| b.slot_id == slot_id && b.status.holds_slot())
            .map(|b| b.value().clone())
            .collect())
    }

    async fn find_by_statuses(&self, statuses: &[BookingStatus]) -> DomainResult<Vec<Booking>> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| statuses.contains(&b.status))
            .map(|b| b.value().clone())
            .collect())
    }

    async fn update(&self, booking: Booking) -> DomainResult<()> {
        let _ledger = self.lock_ledger()?;
        self.replace_booking(booking)
    }

    async fn update_with_slot(&self, booking: Booking, slot_status: SlotStatus) -> DomainResult<()> {
        let _ledger = self.lock_ledger()?;
        if !self.slots.contains_key(&booking.slot_id) {
            return Err(DomainError::not_found("ParkingSlot", "id", &booking.slot_id));
        }
        let slot_id = booking.slot_id.clone();
        self.replace_booking(booking)?;
        self.set_slot_status(&slot_id, slot_status)
    }

    async fn cancel_with_refund(&self, booking: Booking, refunded: Option<Payment>) -> DomainResult<()> {
        let _ledger = self.lock_ledger()?;
        if !self.bookings.contains_key(&booking.id) {
            return Err(DomainError::not_found("Booking", "id", &booking.id));
        }
        if !self.slots.contains_key(&booking.slot_id) {
            return Err(DomainError::not_found("ParkingSlot", "id", &booking.slot_id));
        }
        if let Some(payment) = &refunded {
            if !self.payments.contains_key(&payment.id) {
                return Err(DomainError::not_found("Payment", "id", &payment.id));
            }
        }

        let slot_id = booking.slot_id.clone();
        self.replace_booking(booking)?;
        self.set_slot_status(&slot_id, SlotStatus::Available)?;
        if let Some(payment) = refunded {
            self.payments.insert(payment.id.clone(), payment);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryRepositoryProvider {
    async fn save(&self, payment: Payment) -> DomainResult<()> {
        self.payments.insert(payment.id.clone(), payment);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>> {
        Ok(self.payments.get(id).map(|p| p.clone()))
    }

    async fn update(&self, payment: Payment) -> DomainResult<()> {
        if !self.payments.contains_key(&payment.id) {
            return Err(DomainError::not_found("Payment", "id", &payment.id));
        }
        self.payments.insert(payment.id.clone(), payment);
        Ok(())
    }

    async fn find_by_booking(&self, booking_id: &str) -> DomainResult<Vec<Payment>> {
        let mut found: Vec<_> = self
            .payments
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .map(|p| p.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_by_status(&self, status: PaymentStatus) -> DomainResult<Vec<Payment>> {
        Ok(self
            .payments
            .iter()
            .filter(|p| p.status == status)
            .map(|p| p.value().clone())
            .collect())
    }

    async fn record_webhook(&self, webhook: ProcessedWebhook) -> DomainResult<bool> {
        let key = (webhook.provider.slug().to_string(), webhook.event_key.clone());
        match self.webhooks.entry(key) {
            dashmap::Entry::Occupied(_) => Ok(false),
            dashmap::Entry::Vacant(slot) => {
                slot.insert(webhook);
                Ok(true)
            }
        }
    }

    async fn forget_webhook(&self, provider: &str, event_key: &str) -> DomainResult<()> {
        self.webhooks
            .remove(&(provider.to_string(), event_key.to_string()));
        Ok(())
    }
}
