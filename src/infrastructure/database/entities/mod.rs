//! Database entities module

pub mod booking;
pub mod parking_location;
pub mod parking_slot;
pub mod payment;
pub mod processed_webhook;

pub use booking::Entity as Booking;
pub use parking_location::Entity as ParkingLocation;
pub use parking_slot::Entity as ParkingSlot;
pub use payment::Entity as Payment;
pub use processed_webhook::Entity as ProcessedWebhook;
