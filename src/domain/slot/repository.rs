//! Slot ledger repository interfaces

use async_trait::async_trait;

use super::model::{ParkingLocation, ParkingSlot, SlotStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn save(&self, location: ParkingLocation) -> DomainResult<()>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingLocation>>;
    async fn find_all(&self) -> DomainResult<Vec<ParkingLocation>>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn save(&self, slot: ParkingSlot) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSlot>>;

    /// All slots, optionally restricted to one location
    async fn find_all(&self, location_id: Option<&str>) -> DomainResult<Vec<ParkingSlot>>;

    /// Set the ledger status of a slot
    async fn update_status(&self, id: &str, status: SlotStatus) -> DomainResult<()>;

    async fn count(&self) -> DomainResult<u64>;
}
