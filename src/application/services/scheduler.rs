//! Scheduled booking notifications and the background sweep
//!
//! One pass sends upcoming-booking reminders, end-of-booking warnings and
//! unpaid-booking reminders, and expires bookings nobody showed up for.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::booking::BookingService;
use crate::application::ports::NotificationSink;
use crate::domain::{
    BookingStatus, DomainResult, Notification, NotificationCategory, NotificationPriority,
    PaymentStatus, RepositoryProvider,
};
use crate::shared::ShutdownSignal;

/// Lead times for scheduled notifications
#[derive(Debug, Clone)]
pub struct ScheduleWindows {
    /// Remind about CONFIRMED bookings starting within this window
    pub reminder_lead: Duration,
    /// Reminders this close to the start are HIGH priority
    pub urgent_reminder_lead: Duration,
    /// Warn about ACTIVE bookings ending within this window
    pub expiry_warning_lead: Duration,
    /// Remind about payments left PENDING for longer than this
    pub payment_reminder_after: Duration,
}

impl Default for ScheduleWindows {
    fn default() -> Self {
        Self {
            reminder_lead: Duration::hours(2),
            urgent_reminder_lead: Duration::hours(1),
            expiry_warning_lead: Duration::minutes(30),
            payment_reminder_after: Duration::hours(1),
        }
    }
}

/// Notifications sent by one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduledNotifications {
    pub reminders: usize,
    pub expiry_warnings: usize,
    pub payment_reminders: usize,
}

pub struct Scheduler {
    repos: Arc<dyn RepositoryProvider>,
    bookings: Arc<BookingService>,
    notifier: Arc<dyn NotificationSink>,
    windows: ScheduleWindows,
}

impl Scheduler {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        bookings: Arc<BookingService>,
        notifier: Arc<dyn NotificationSink>,
        windows: ScheduleWindows,
    ) -> Self {
        Self {
            repos,
            bookings,
            notifier,
            windows,
        }
    }

    pub async fn process_scheduled_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> DomainResult<ScheduledNotifications> {
        let mut sent = ScheduledNotifications::default();

        let confirmed = self
            .repos
            .bookings()
            .find_by_statuses(&[BookingStatus::Confirmed])
            .await?;
        for booking in confirmed {
            let until_start = booking.start_time - now;
            if until_start <= Duration::zero() || until_start > self.windows.reminder_lead {
                continue;
            }
            let priority = if until_start <= self.windows.urgent_reminder_lead {
                NotificationPriority::High
            } else {
                NotificationPriority::Normal
            };
            self.send(Notification::new(
                &booking.user_id,
                "Booking Reminder",
                format!(
                    "Your parking booking starts in {} minutes",
                    until_start.num_minutes()
                ),
                NotificationCategory::Booking,
                priority,
                json!({ "bookingId": booking.id, "type": "BOOKING_REMINDER" }),
            ))
            .await;
            sent.reminders += 1;
        }

        let active = self
            .repos
            .bookings()
            .find_by_statuses(&[BookingStatus::Active])
            .await?;
        for booking in active {
            let until_end = booking.end_time - now;
            if until_end <= Duration::zero() || until_end > self.windows.expiry_warning_lead {
                continue;
            }
            self.send(Notification::new(
                &booking.user_id,
                "Parking Time Expiring",
                format!(
                    "Your parking time ends in {} minutes. Extend your booking to avoid overtime charges.",
                    until_end.num_minutes()
                ),
                NotificationCategory::Expiry,
                NotificationPriority::Urgent,
                json!({ "bookingId": booking.id, "type": "EXPIRY_WARNING" }),
            ))
            .await;
            sent.expiry_warnings += 1;
        }

        let pending = self
            .repos
            .payments()
            .find_by_status(PaymentStatus::Pending)
            .await?;
        for payment in pending {
            if now - payment.created_at <= self.windows.payment_reminder_after {
                continue;
            }
            self.send(Notification::new(
                &payment.user_id,
                "Payment Pending",
                "Please complete your payment to confirm your booking",
                NotificationCategory::Payment,
                NotificationPriority::High,
                json!({
                    "bookingId": payment.booking_id,
                    "paymentId": payment.id,
                    "type": "PAYMENT_REMINDER",
                }),
            ))
            .await;
            sent.payment_reminders += 1;
        }

        Ok(sent)
    }

    /// One full pass: expiry sweep, then notifications
    pub async fn run_once(&self, now: DateTime<Utc>) -> DomainResult<(usize, ScheduledNotifications)> {
        let expired = self.bookings.expire_overdue_bookings_at(now).await?;
        let sent = self.process_scheduled_notifications(now).await?;
        Ok((expired, sent))
    }

    async fn send(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(error = %e, "Scheduled notification failed");
        }
    }
}

/// Run the scheduler every `interval_secs` until shutdown.
pub fn start_scheduler_task(
    scheduler: Arc<Scheduler>,
    shutdown: ShutdownSignal,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = interval_secs, "Booking scheduler started");

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match scheduler.run_once(Utc::now()).await {
                        Ok((expired, sent)) => {
                            if expired + sent.reminders + sent.expiry_warnings + sent.payment_reminders > 0 {
                                info!(
                                    expired,
                                    reminders = sent.reminders,
                                    expiry_warnings = sent.expiry_warnings,
                                    payment_reminders = sent.payment_reminders,
                                    "Scheduler pass finished"
                                );
                            }
                        }
                        Err(e) => warn!(error = %e, "Scheduler pass failed"),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("Booking scheduler shutting down");
                    break;
                }
            }
        }

        info!("Booking scheduler stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::Fixture;
    use crate::domain::{Payment, PaymentMethod};

    fn scheduler(fx: &Fixture) -> Scheduler {
        Scheduler::new(
            fx.repos.clone(),
            fx.bookings.clone(),
            fx.sink.clone(),
            ScheduleWindows::default(),
        )
    }

    fn by_type(fx: &Fixture, kind: &str) -> Vec<Notification> {
        fx.sink
            .sent()
            .into_iter()
            .filter(|n| n.metadata["type"] == kind)
            .collect()
    }

    #[tokio::test]
    async fn reminder_priority_depends_on_lead_time() {
        let fx = Fixture::new(850).await;
        let now = Utc::now();
        let booking = fx.book(now + Duration::minutes(90), now + Duration::minutes(150), 850).await;
        fx.pay(&booking, now).await;

        let sent = scheduler(&fx).process_scheduled_notifications(now).await.unwrap();
        assert_eq!(sent.reminders, 1);

        let later = now + Duration::minutes(40);
        scheduler(&fx).process_scheduled_notifications(later).await.unwrap();

        let reminders = by_type(&fx, "BOOKING_REMINDER");
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].priority, NotificationPriority::Normal);
        assert_eq!(reminders[1].priority, NotificationPriority::High);
    }

    #[tokio::test]
    async fn no_reminder_outside_window() {
        let fx = Fixture::new(850).await;
        let now = Utc::now();
        let booking = fx.book(now + Duration::hours(3), now + Duration::hours(4), 850).await;
        fx.pay(&booking, now).await;

        let sent = scheduler(&fx).process_scheduled_notifications(now).await.unwrap();
        assert_eq!(sent, ScheduledNotifications::default());
    }

    #[tokio::test]
    async fn active_booking_near_end_gets_urgent_warning() {
        let fx = Fixture::new(850).await;
        let now = Utc::now();
        let start = now + Duration::minutes(10);
        let booking = fx.book(start, start + Duration::hours(1), 850).await;
        fx.pay(&booking, now).await;
        fx.bookings.check_in_at(&booking.qr_code, None, start).await.unwrap();

        let near_end = booking.end_time - Duration::minutes(20);
        let sent = scheduler(&fx)
            .process_scheduled_notifications(near_end)
            .await
            .unwrap();
        assert_eq!(sent.expiry_warnings, 1);

        let warning = by_type(&fx, "EXPIRY_WARNING").pop().unwrap();
        assert_eq!(warning.priority, NotificationPriority::Urgent);
        assert_eq!(warning.category, NotificationCategory::Expiry);
    }

    #[tokio::test]
    async fn stale_pending_payment_gets_reminder() {
        let fx = Fixture::new(850).await;
        let now = Utc::now();
        let booking = fx.book(now + Duration::hours(5), now + Duration::hours(6), 850).await;
        let mut payment = Payment::new(&booking.id, &booking.user_id, 850, PaymentMethod::Cash);
        payment.created_at = now - Duration::minutes(61);
        fx.repos.payments().save(payment).await.unwrap();

        let sent = scheduler(&fx).process_scheduled_notifications(now).await.unwrap();
        assert_eq!(sent.payment_reminders, 1);
        assert_eq!(by_type(&fx, "PAYMENT_REMINDER")[0].priority, NotificationPriority::High);
    }

    #[tokio::test]
    async fn run_once_expires_before_notifying() {
        let fx = Fixture::new(850).await;
        let now = Utc::now();
        let booking = fx.book(now + Duration::hours(1), now + Duration::hours(2), 850).await;

        let after = booking.end_time + Duration::minutes(30);
        let (expired, _) = scheduler(&fx).run_once(after).await.unwrap();
        assert_eq!(expired, 1);
    }

    #[tokio::test]
    async fn task_stops_on_shutdown() {
        let fx = Fixture::new(850).await;
        let shutdown = ShutdownSignal::new();
        let handle = start_scheduler_task(Arc::new(scheduler(&fx)), shutdown.clone(), 3600);

        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
