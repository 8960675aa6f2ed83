//! Repository access for the domain layer

use super::booking::BookingRepository;
use super::payment::PaymentRepository;
use super::slot::{LocationRepository, SlotRepository};

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let slot = repos.slots().find_by_id("slot-1").await?;
///     let holding = repos.bookings().find_holding_for_slot("slot-1").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn locations(&self) -> &dyn LocationRepository;
    fn slots(&self) -> &dyn SlotRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn payments(&self) -> &dyn PaymentRepository;
}
