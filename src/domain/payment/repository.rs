//! Payment repository interface

use async_trait::async_trait;

use super::model::{Payment, PaymentStatus, ProcessedWebhook};
use crate::domain::DomainResult;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn save(&self, payment: Payment) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>>;

    async fn update(&self, payment: Payment) -> DomainResult<()>;

    /// Every payment made against a booking, newest first
    async fn find_by_booking(&self, booking_id: &str) -> DomainResult<Vec<Payment>>;

    async fn find_by_status(&self, status: PaymentStatus) -> DomainResult<Vec<Payment>>;

    /// Record a webhook in the dedup table.
    ///
    /// Returns `false` when the same (provider, event key) was already recorded.
    async fn record_webhook(&self, webhook: ProcessedWebhook) -> DomainResult<bool>;

    /// Drop a dedup record so a failed application can be redelivered
    async fn forget_webhook(&self, provider: &str, event_key: &str) -> DomainResult<()>;
}
