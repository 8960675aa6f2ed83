//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::slot::{LocationRepository, SlotRepository};

use super::booking_repository::SeaOrmBookingRepository;
use super::location_repository::SeaOrmLocationRepository;
use super::payment_repository::SeaOrmPaymentRepository;
use super::slot_repository::SeaOrmSlotRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let slot = repos.slots().find_by_id("slot-1").await?;
/// let holding = repos.bookings().find_holding_for_slot("slot-1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    locations: SeaOrmLocationRepository,
    slots: SeaOrmSlotRepository,
    bookings: SeaOrmBookingRepository,
    payments: SeaOrmPaymentRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            locations: SeaOrmLocationRepository::new(db.clone()),
            slots: SeaOrmSlotRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn locations(&self) -> &dyn LocationRepository {
        &self.locations
    }

    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }
}
