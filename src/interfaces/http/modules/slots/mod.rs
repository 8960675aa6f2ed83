//! Slot and location lookup

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
