//! Application services

mod booking;
mod codes;
mod payment;
mod scheduler;
mod slot_locks;
mod webhooks;

#[cfg(test)]
pub(crate) mod testing;

pub use booking::{
    BookingService, CancellationResult, CheckInDetails, CheckOutResult, CreateBooking,
    ExtensionResult,
};
pub use codes::{CodeGenerator, QrCodeData};
pub use payment::{
    GatewayRegistry, InitiatePayment, PaymentDetails, PaymentOutcome, PaymentService, WebhookAck,
};
pub use scheduler::{start_scheduler_task, ScheduleWindows, ScheduledNotifications, Scheduler};
pub use slot_locks::SlotLocks;
pub use webhooks::{WebhookEvent, WebhookOutcome};
