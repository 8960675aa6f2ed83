//! Payment module: initiate, status, cash confirmation

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
