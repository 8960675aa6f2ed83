//! Slot ledger aggregate
//!
//! Parking locations, their slots, and the occupancy status of each slot.

pub mod model;
pub mod repository;

pub use model::{ParkingLocation, ParkingSlot, SlotStatus};
pub use repository::{LocationRepository, SlotRepository};
