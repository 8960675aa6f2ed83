//! Booking aggregate
//!
//! Contains the Booking entity, its lifecycle rules, and repository interface.

pub mod model;
pub mod repository;

pub use model::{overtime_charge, Booking, BookingPolicy, BookingStatus, CheckOutSummary};
pub use repository::BookingRepository;
