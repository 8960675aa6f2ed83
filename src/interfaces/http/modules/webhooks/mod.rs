//! Payment provider callbacks

pub mod handlers;

pub use handlers::*;
