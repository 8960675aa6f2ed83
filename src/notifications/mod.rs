//! Notifications module
//!
//! In-process delivery of user notifications and scheduler events over a
//! broadcast bus. Push, SMS and email channels subscribe to the bus; the
//! service ships with a logging subscriber only.
//!
//! # Usage
//! ```ignore
//! use waypark::notifications::{create_event_bus, Event};
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//! while let Some(message) = subscriber.recv().await {
//!     println!("{}", message.event.event_type());
//! }
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, spawn_log_subscriber, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
