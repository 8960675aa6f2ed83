//! Notification events
//!
//! Everything the booking core broadcasts to in-process subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Notification;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A user-facing notification was issued
    Notification(Notification),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Notification(_) => "notification",
        }
    }

    /// Recipient, for user-scoped events
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Event::Notification(n) => Some(&n.user_id),
        }
    }
}

/// Envelope carried on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
