//! Shared fixtures for service tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::booking::{BookingService, CreateBooking};
use super::codes::CodeGenerator;
use crate::application::ports::NotificationSink;
use crate::domain::{
    Booking, BookingPolicy, DomainError, DomainResult, Notification, ParkingLocation, ParkingSlot,
    Payment, PaymentMethod, RepositoryProvider,
};
use crate::infrastructure::storage::InMemoryRepositoryProvider;

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// `metadata.type` of every notification, in order
    pub fn types(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|n| n.metadata["type"].as_str().map(String::from))
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: Notification) -> DomainResult<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn notify(&self, _notification: Notification) -> DomainResult<()> {
        Err(DomainError::Storage("push channel down".to_string()))
    }
}

pub struct Fixture {
    pub repos: Arc<InMemoryRepositoryProvider>,
    pub sink: Arc<RecordingSink>,
    pub bookings: Arc<BookingService>,
    pub location: ParkingLocation,
    pub slot: ParkingSlot,
}

impl Fixture {
    pub async fn new(base_price: i64) -> Self {
        let sink = Arc::new(RecordingSink::default());
        Self::with_sink(base_price, sink.clone(), sink).await
    }

    pub async fn with_sink(
        base_price: i64,
        sink: Arc<RecordingSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let location = ParkingLocation::new("Bole Medhanialem", "Bole Road, Addis Ababa");
        let slot = ParkingSlot::new(&location.id, "A-01", base_price);
        repos.locations().save(location.clone()).await.unwrap();
        repos.slots().save(slot.clone()).await.unwrap();

        let bookings = Arc::new(BookingService::new(
            repos.clone(),
            Arc::new(CodeGenerator::new("test-secret")),
            notifier,
            BookingPolicy::default(),
        ));

        Self {
            repos,
            sink,
            bookings,
            location,
            slot,
        }
    }

    pub async fn book(&self, start: DateTime<Utc>, end: DateTime<Utc>, total: i64) -> Booking {
        self.bookings
            .create_booking(CreateBooking {
                user_id: "user-1".to_string(),
                slot_id: self.slot.id.clone(),
                start_time: start,
                end_time: end,
                total_amount: total,
            })
            .await
            .unwrap()
    }

    /// Store a completed cash payment of `amount` for the booking
    pub async fn completed_payment(&self, booking: &Booking, amount: i64, now: DateTime<Utc>) -> Payment {
        let mut payment = Payment::new(&booking.id, &booking.user_id, amount, PaymentMethod::Cash);
        payment.complete(None, "{}".to_string(), now).unwrap();
        self.repos.payments().save(payment.clone()).await.unwrap();
        payment
    }

    /// Pay the booking in full and confirm it
    pub async fn pay(&self, booking: &Booking, now: DateTime<Utc>) -> Booking {
        let payment = self.completed_payment(booking, booking.total_amount, now).await;
        self.bookings
            .confirm_booking_payment_at(&booking.id, &payment.id, now)
            .await
            .unwrap()
    }

    pub async fn slot_status(&self) -> crate::domain::SlotStatus {
        self.repos
            .slots()
            .find_by_id(&self.slot.id)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}
