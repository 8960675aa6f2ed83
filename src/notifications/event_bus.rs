//! Event Bus for broadcasting events to subscribers
//!
//! Uses tokio broadcast channel for pub/sub pattern.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::events::{Event, EventMessage};
use crate::application::ports::NotificationSink;
use crate::domain::{DomainResult, Notification};
use crate::shared::ShutdownSignal;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let user_id = message.event.user_id().map(String::from);

        match self.sender.send(message) {
            Ok(count) => {
                debug!(
                    "Event published: type={}, user={:?}, subscribers={}",
                    event_type, user_id, count
                );
            }
            Err(_) => {
                debug!(
                    "Event published (no subscribers): type={}, user={:?}",
                    event_type, user_id
                );
            }
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!("New event subscriber, total: {}", count);

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for EventBus {
    async fn notify(&self, notification: Notification) -> DomainResult<()> {
        metrics::counter!(
            "notifications_published_total",
            "category" => format!("{:?}", notification.category)
        )
        .increment(1);
        self.publish(Event::Notification(notification));
        Ok(())
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Receive the next event; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Subscriber lagged, {} events missed", count);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return None;
                }
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        info!("Event subscriber disconnected, remaining: {}", prev - 1);
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

/// Log every notification until shutdown. Stands in for real delivery
/// channels (push, SMS, email).
pub fn spawn_log_subscriber(bus: &EventBus, shutdown: ShutdownSignal) -> JoinHandle<()> {
    let mut subscriber = bus.subscribe();
    tokio::spawn(async move {
        let stop = shutdown.notified().wait();
        tokio::pin!(stop);
        loop {
            tokio::select! {
                message = subscriber.recv() => {
                    let Some(message) = message else { break };
                    let Event::Notification(n) = &message.event;
                    info!(
                        "Notification for {}: [{:?}/{:?}] {} - {}",
                        n.user_id, n.category, n.priority, n.title, n.message
                    );
                }
                _ = &mut stop => break,
            }
        }
        info!("Notification log subscriber stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookingUpdate;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new();
        let mut subscriber = bus.subscribe();

        bus.notify(BookingUpdate::Created.notification("user-1", "b-1"))
            .await
            .unwrap();

        let received = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            subscriber.recv(),
        )
        .await
        .expect("Timeout")
        .expect("No message");

        assert_eq!(received.event.event_type(), "notification");
        assert_eq!(received.event.user_id(), Some("user-1"));
    }

    #[tokio::test]
    async fn notify_without_subscribers_succeeds() {
        let bus = EventBus::new();
        assert!(bus
            .notify(BookingUpdate::Expired.notification("user-1", "b-1"))
            .await
            .is_ok());
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let sub1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(sub1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn log_subscriber_stops_on_shutdown() {
        let bus = EventBus::new();
        let shutdown = ShutdownSignal::new();
        let handle = spawn_log_subscriber(&bus, shutdown.clone());

        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("subscriber did not stop")
            .unwrap();
    }
}
