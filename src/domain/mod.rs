//! Domain layer: entities, lifecycle rules and repository interfaces

pub mod booking;
pub mod notification;
pub mod payment;
pub mod repositories;
pub mod slot;

pub use booking::{Booking, BookingPolicy, BookingStatus, CheckOutSummary};
pub use notification::{BookingUpdate, Notification, NotificationCategory, NotificationPriority};
pub use payment::{Payment, PaymentMethod, PaymentProvider, PaymentStatus, ProcessedWebhook};
pub use repositories::RepositoryProvider;
pub use slot::{ParkingLocation, ParkingSlot, SlotStatus};

pub use crate::shared::errors::{DomainError, DomainResult, TimingError};
