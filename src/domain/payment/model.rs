//! Payment domain entity

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, DomainResult};

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Telebirr,
    CbeBirr,
    Chapa,
    /// Paid at the location, confirmed by an attendant
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Telebirr => "TELEBIRR",
            Self::CbeBirr => "CBE_BIRR",
            Self::Chapa => "CHAPA",
            Self::Cash => "CASH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TELEBIRR" => Some(Self::Telebirr),
            "CBE_BIRR" => Some(Self::CbeBirr),
            "CHAPA" => Some(Self::Chapa),
            "CASH" => Some(Self::Cash),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Telebirr => "Telebirr",
            Self::CbeBirr => "CBE Birr",
            Self::Chapa => "Chapa",
            Self::Cash => "Cash",
        }
    }

    /// External provider behind this method; cash has none
    pub fn provider(&self) -> Option<PaymentProvider> {
        match self {
            Self::Telebirr => Some(PaymentProvider::Telebirr),
            Self::CbeBirr => Some(PaymentProvider::CbeBirr),
            Self::Chapa => Some(PaymentProvider::Chapa),
            Self::Cash => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Still waiting for an outcome
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// External payment provider that can call the webhook endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentProvider {
    Telebirr,
    CbeBirr,
    Chapa,
}

impl PaymentProvider {
    /// Identifier used in webhook URLs and the dedup table
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Telebirr => "telebirr",
            Self::CbeBirr => "cbe",
            Self::Chapa => "chapa",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "telebirr" => Some(Self::Telebirr),
            "cbe" | "cbe_birr" | "cbebirr" => Some(Self::CbeBirr),
            "chapa" => Some(Self::Chapa),
            _ => None,
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Telebirr => PaymentMethod::Telebirr,
            Self::CbeBirr => PaymentMethod::CbeBirr,
            Self::Chapa => PaymentMethod::Chapa,
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// A payment attempt for a booking
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub user_id: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Provider-side transaction reference
    pub transaction_id: Option<String>,
    /// Raw provider response (JSON), kept for audit
    pub gateway_response: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        booking_id: impl Into<String>,
        user_id: impl Into<String>,
        amount: i64,
        method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking_id.into(),
            user_id: user_id.into(),
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            gateway_response: None,
            paid_at: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// PENDING -> PROCESSING, before calling out to the provider
    pub fn mark_processing(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[PaymentStatus::Pending], PaymentStatus::Processing, now)
    }

    /// Provider accepted the request but the customer still has to finish it
    /// elsewhere (hosted checkout, cash desk).
    pub fn await_confirmation(&mut self, gateway_response: String, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(
            &[PaymentStatus::Pending, PaymentStatus::Processing],
            PaymentStatus::Pending,
            now,
        )?;
        self.gateway_response = Some(gateway_response);
        Ok(())
    }

    pub fn complete(
        &mut self,
        transaction_id: Option<String>,
        gateway_response: String,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.transition(
            &[PaymentStatus::Pending, PaymentStatus::Processing],
            PaymentStatus::Completed,
            now,
        )?;
        if transaction_id.is_some() {
            self.transaction_id = transaction_id;
        }
        self.gateway_response = Some(gateway_response);
        self.paid_at = Some(now);
        Ok(())
    }

    pub fn fail(&mut self, gateway_response: Option<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(
            &[PaymentStatus::Pending, PaymentStatus::Processing],
            PaymentStatus::Failed,
            now,
        )?;
        if gateway_response.is_some() {
            self.gateway_response = gateway_response;
        }
        Ok(())
    }

    pub fn refund(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[PaymentStatus::Completed], PaymentStatus::Refunded, now)?;
        self.refunded_at = Some(now);
        Ok(())
    }

    fn transition(
        &mut self,
        allowed: &[PaymentStatus],
        to: PaymentStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !allowed.contains(&self.status) {
            return Err(DomainError::InvalidState(format!(
                "Payment {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

/// A provider callback that has already been applied
#[derive(Debug, Clone)]
pub struct ProcessedWebhook {
    pub provider: PaymentProvider,
    /// Provider-side key of the callback (transaction id, or reference + outcome)
    pub event_key: String,
    pub payment_id: String,
    pub received_at: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> Payment {
        Payment::new("booking-1", "user-1", 1350, PaymentMethod::Telebirr)
    }

    #[test]
    fn completes_from_processing() {
        let mut p = payment();
        let now = Utc::now();
        p.mark_processing(now).unwrap();
        p.complete(Some("TB-1".into()), "{}".into(), now).unwrap();

        assert_eq!(p.status, PaymentStatus::Completed);
        assert_eq!(p.transaction_id.as_deref(), Some("TB-1"));
        assert_eq!(p.paid_at, Some(now));
    }

    #[test]
    fn completed_payment_cannot_complete_again() {
        let mut p = payment();
        let now = Utc::now();
        p.complete(None, "{}".into(), now).unwrap();
        assert!(matches!(
            p.complete(None, "{}".into(), now),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn failure_keeps_previous_response_when_none_given() {
        let mut p = payment();
        let now = Utc::now();
        p.await_confirmation(r#"{"checkout":"x"}"#.into(), now).unwrap();
        p.fail(None, now).unwrap();
        assert_eq!(p.status, PaymentStatus::Failed);
        assert_eq!(p.gateway_response.as_deref(), Some(r#"{"checkout":"x"}"#));
    }

    #[test]
    fn only_completed_payments_refund() {
        let now = Utc::now();
        let mut p = payment();
        assert!(p.refund(now).is_err());

        p.complete(None, "{}".into(), now).unwrap();
        p.refund(now).unwrap();
        assert_eq!(p.status, PaymentStatus::Refunded);
        assert_eq!(p.refunded_at, Some(now));
    }

    #[test]
    fn provider_slugs() {
        assert_eq!(PaymentProvider::from_slug("cbe"), Some(PaymentProvider::CbeBirr));
        assert_eq!(PaymentProvider::from_slug("Chapa"), Some(PaymentProvider::Chapa));
        assert_eq!(PaymentProvider::from_slug("paypal"), None);
        assert_eq!(PaymentProvider::Telebirr.method(), PaymentMethod::Telebirr);
        assert_eq!(PaymentMethod::Cash.provider(), None);
    }

    #[test]
    fn method_and_status_parse_stored_values() {
        for m in [
            PaymentMethod::Telebirr,
            PaymentMethod::CbeBirr,
            PaymentMethod::Chapa,
            PaymentMethod::Cash,
        ] {
            assert_eq!(PaymentMethod::from_str(m.as_str()), Some(m));
        }
        assert_eq!(PaymentStatus::from_str("REFUNDED"), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::from_str("paid"), None);
    }
}
