//! Simulated provider gateway
//!
//! Answers with the same response shapes the real Telebirr, CBE Birr and
//! Chapa integrations produce, after an artificial delay and with a
//! configurable approval rate. Used until real provider credentials exist.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use tracing::debug;

use crate::application::ports::{GatewayRequest, GatewayResponse, PaymentGateway};
use crate::domain::{DomainResult, PaymentProvider};

#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    provider: PaymentProvider,
    success_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(provider: PaymentProvider, success_rate: f64, latency: Duration) -> Self {
        Self {
            provider,
            success_rate: success_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    /// Approval rate and latency typical of each provider
    pub fn with_defaults(provider: PaymentProvider) -> Self {
        let (success_rate, latency_ms) = match provider {
            PaymentProvider::Telebirr => (0.85, 1000),
            PaymentProvider::CbeBirr => (0.90, 1200),
            PaymentProvider::Chapa => (1.0, 800),
        };
        Self::new(provider, success_rate, Duration::from_millis(latency_ms))
    }

    fn random_suffix(len: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect()
    }

    fn approved(&self, request: &GatewayRequest) -> GatewayResponse {
        let millis = Utc::now().timestamp_millis();
        match self.provider {
            PaymentProvider::Chapa => {
                let payment_url = format!("https://checkout.chapa.co/pay/{}", Self::random_suffix(16));
                GatewayResponse {
                    success: true,
                    transaction_id: None,
                    payment_url: Some(payment_url.clone()),
                    error: None,
                    raw: json!({
                        "success": true,
                        "paymentUrl": payment_url,
                        "checkoutId": format!("chapa_{millis}"),
                    }),
                }
            }
            PaymentProvider::Telebirr | PaymentProvider::CbeBirr => {
                let prefix = if self.provider == PaymentProvider::Telebirr { "TB" } else { "CBE" };
                let transaction_id = format!("{prefix}-{millis}-{}", Self::random_suffix(9));
                GatewayResponse {
                    success: true,
                    transaction_id: Some(transaction_id.clone()),
                    payment_url: None,
                    error: None,
                    raw: json!({
                        "success": true,
                        "transactionId": transaction_id,
                        "status": "COMPLETED",
                        "amount": request.amount,
                    }),
                }
            }
        }
    }

    fn declined(&self) -> GatewayResponse {
        let error = match self.provider {
            PaymentProvider::Telebirr => "Insufficient balance or invalid phone number",
            PaymentProvider::CbeBirr => "Transaction declined by bank",
            PaymentProvider::Chapa => "Checkout could not be created",
        };
        GatewayResponse {
            success: false,
            transaction_id: None,
            payment_url: None,
            error: Some(error.to_string()),
            raw: json!({ "success": false, "error": error }),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn provider(&self) -> PaymentProvider {
        self.provider
    }

    async fn charge(&self, request: &GatewayRequest) -> DomainResult<GatewayResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let approve = rand::thread_rng().gen_bool(self.success_rate);
        debug!(
            provider = %self.provider,
            reference = %request.reference,
            approve,
            "Simulated provider call"
        );

        Ok(if approve {
            self.approved(request)
        } else {
            self.declined()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GatewayRequest {
        GatewayRequest {
            reference: "pay-1".to_string(),
            amount: 1350,
            phone_number: Some("+251911000000".to_string()),
            return_url: None,
        }
    }

    #[tokio::test]
    async fn telebirr_approval_carries_transaction_id() {
        let gateway = SimulatedGateway::new(PaymentProvider::Telebirr, 1.0, Duration::ZERO);
        let response = gateway.charge(&request()).await.unwrap();

        assert!(response.success);
        let txn = response.transaction_id.unwrap();
        assert!(txn.starts_with("TB-"));
        assert_eq!(response.raw["amount"], 1350);
        assert_eq!(response.raw["status"], "COMPLETED");
    }

    #[tokio::test]
    async fn cbe_decline_reports_error() {
        let gateway = SimulatedGateway::new(PaymentProvider::CbeBirr, 0.0, Duration::ZERO);
        let response = gateway.charge(&request()).await.unwrap();

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Transaction declined by bank"));
        assert_eq!(response.raw["success"], false);
    }

    #[tokio::test]
    async fn chapa_returns_checkout_url() {
        let gateway = SimulatedGateway::with_defaults(PaymentProvider::Chapa);
        let gateway = SimulatedGateway::new(gateway.provider(), 1.0, Duration::ZERO);
        let response = gateway.charge(&request()).await.unwrap();

        assert!(response.success);
        assert!(response.transaction_id.is_none());
        assert!(response
            .payment_url
            .unwrap()
            .starts_with("https://checkout.chapa.co/pay/"));
    }
}
