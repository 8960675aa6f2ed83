pub mod bookings;
pub mod checkin;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod request_id;
pub mod slots;
pub mod webhooks;
