//! Payment aggregate

pub mod model;
pub mod repository;

pub use model::{Payment, PaymentMethod, PaymentProvider, PaymentStatus, ProcessedWebhook};
pub use repository::PaymentRepository;
