//! Attendant check-in by QR payload or 6-digit code

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
