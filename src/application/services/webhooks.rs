//! Provider webhook payloads
//!
//! Each provider reports outcomes with its own field names; they are
//! normalized here into one [`WebhookEvent`].
//!
//! | provider | reference    | status        | transaction id   |
//! |----------|--------------|---------------|------------------|
//! | telebirr | `outTradeNo` | `tradeStatus` | `transactionNo`  |
//! | cbe      | `reference`  | `status`      | `transactionId`  |
//! | chapa    | `reference`  | `status`      | `transaction_id` |

use serde_json::Value;

use crate::domain::{DomainError, DomainResult, PaymentProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Succeeded,
    Failed,
    /// Intermediate notice; nothing to apply yet
    Pending,
}

impl WebhookOutcome {
    fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "success" | "successful" | "completed" | "paid" => Self::Succeeded,
            "failed" | "failure" | "declined" | "cancelled" | "canceled" | "expired" => Self::Failed,
            _ => Self::Pending,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

/// A provider callback reduced to what the payment flow needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub provider: PaymentProvider,
    /// Our payment id, sent to the provider as the request reference
    pub reference: String,
    pub outcome: WebhookOutcome,
    pub transaction_id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(provider: PaymentProvider, payload: &Value) -> DomainResult<Self> {
        let (reference_field, status_field, txn_field) = match provider {
            PaymentProvider::Telebirr => ("outTradeNo", "tradeStatus", "transactionNo"),
            PaymentProvider::CbeBirr => ("reference", "status", "transactionId"),
            PaymentProvider::Chapa => ("reference", "status", "transaction_id"),
        };

        let reference = string_field(payload, reference_field).ok_or_else(|| {
            DomainError::Validation(format!("{provider} webhook is missing '{reference_field}'"))
        })?;
        let status = string_field(payload, status_field).ok_or_else(|| {
            DomainError::Validation(format!("{provider} webhook is missing '{status_field}'"))
        })?;

        Ok(Self {
            provider,
            reference,
            outcome: WebhookOutcome::from_status(&status),
            transaction_id: string_field(payload, txn_field),
        })
    }

    /// Key under which this callback is recorded for replay protection.
    /// The outcome is part of the key, so a later callback with a different
    /// outcome for the same transaction is not taken for a replay.
    pub fn dedup_key(&self) -> String {
        let subject = self.transaction_id.as_deref().unwrap_or(&self.reference);
        format!("{}:{}", subject, self.outcome.as_str())
    }
}

fn string_field(payload: &Value, name: &str) -> Option<String> {
    match payload.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn telebirr_fields() {
        let event = WebhookEvent::parse(
            PaymentProvider::Telebirr,
            &json!({"outTradeNo": "pay-1", "tradeStatus": "Completed", "transactionNo": "TB-9"}),
        )
        .unwrap();

        assert_eq!(event.reference, "pay-1");
        assert_eq!(event.outcome, WebhookOutcome::Succeeded);
        assert_eq!(event.dedup_key(), "TB-9:succeeded");
    }

    #[test]
    fn chapa_failure_without_transaction_id() {
        let event = WebhookEvent::parse(
            PaymentProvider::Chapa,
            &json!({"reference": "pay-2", "status": "failed"}),
        )
        .unwrap();

        assert_eq!(event.outcome, WebhookOutcome::Failed);
        assert_eq!(event.transaction_id, None);
        assert_eq!(event.dedup_key(), "pay-2:failed");
    }

    #[test]
    fn outcome_is_part_of_dedup_key() {
        let failed = WebhookEvent::parse(
            PaymentProvider::Chapa,
            &json!({"reference": "pay-4", "status": "failed", "transaction_id": "CH-5"}),
        )
        .unwrap();
        let succeeded = WebhookEvent::parse(
            PaymentProvider::Chapa,
            &json!({"reference": "pay-4", "status": "success", "transaction_id": "CH-5"}),
        )
        .unwrap();

        assert_eq!(failed.dedup_key(), "CH-5:failed");
        assert_ne!(failed.dedup_key(), succeeded.dedup_key());
    }

    #[test]
    fn unknown_status_is_pending() {
        let event = WebhookEvent::parse(
            PaymentProvider::CbeBirr,
            &json!({"reference": "pay-3", "status": "QUEUED", "transactionId": "CBE-1"}),
        )
        .unwrap();
        assert_eq!(event.outcome, WebhookOutcome::Pending);
    }

    #[test]
    fn missing_reference_is_rejected() {
        let err = WebhookEvent::parse(PaymentProvider::Chapa, &json!({"status": "success"})).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // field names do not carry over between providers
        let err = WebhookEvent::parse(
            PaymentProvider::Telebirr,
            &json!({"reference": "pay-1", "status": "success"}),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
