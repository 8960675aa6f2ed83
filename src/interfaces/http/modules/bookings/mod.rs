//! Booking module: create, list, extend, cancel, check-out

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
