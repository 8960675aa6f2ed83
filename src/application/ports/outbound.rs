//! Outbound ports the booking core calls out through
//!
//! [`PaymentGateway`] decouples the payment service from concrete provider
//! clients; [`NotificationSink`] decouples it from notification delivery.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{DomainResult, Notification, PaymentProvider};

/// What the core asks a provider to charge
#[derive(Debug, Clone, Serialize)]
pub struct GatewayRequest {
    /// Our payment id, echoed back by providers in callbacks
    pub reference: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    pub phone_number: Option<String>,
    pub return_url: Option<String>,
}

/// Uniform provider answer: `{success, transactionId | error, paymentUrl?}`
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub success: bool,
    pub transaction_id: Option<String>,
    /// Hosted checkout to redirect the customer to (asynchronous providers)
    pub payment_url: Option<String>,
    pub error: Option<String>,
    /// Untouched provider payload, stored for audit
    pub raw: serde_json::Value,
}

impl GatewayResponse {
    pub fn raw_string(&self) -> String {
        self.raw.to_string()
    }
}

/// A payment provider API.
///
/// `Err` means the call itself failed (transport, malformed answer); a
/// declined payment is `Ok` with `success == false`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    async fn charge(&self, request: &GatewayRequest) -> DomainResult<GatewayResponse>;
}

/// Fire-and-forget delivery of user notifications.
///
/// Callers log and ignore errors; delivery never blocks a booking operation.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> DomainResult<()>;
}
