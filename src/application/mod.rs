//! Application layer: booking and payment use cases

pub mod ports;
pub mod services;

pub use ports::{GatewayRequest, GatewayResponse, NotificationSink, PaymentGateway};
pub use services::{
    start_scheduler_task, BookingService, CancellationResult, CheckInDetails, CheckOutResult,
    CodeGenerator, CreateBooking, ExtensionResult, GatewayRegistry, InitiatePayment,
    PaymentDetails, PaymentOutcome, PaymentService, ScheduleWindows, ScheduledNotifications,
    Scheduler, WebhookAck,
};
