//! Payment service
//!
//! Creates payment attempts, drives them through the provider gateways and
//! provider callbacks, and hands completed payments to the booking service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::booking::BookingService;
use super::webhooks::{WebhookEvent, WebhookOutcome};
use crate::application::ports::{GatewayRequest, GatewayResponse, PaymentGateway};
use crate::domain::{
    Booking, BookingStatus, DomainError, DomainResult, Payment, PaymentMethod, PaymentProvider,
    PaymentStatus, ProcessedWebhook, RepositoryProvider,
};

/// Gateways by provider
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<PaymentProvider, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateways.insert(gateway.provider(), gateway);
        self
    }

    pub fn get(&self, provider: PaymentProvider) -> DomainResult<Arc<dyn PaymentGateway>> {
        self.gateways.get(&provider).cloned().ok_or_else(|| {
            DomainError::Provider(format!("No gateway configured for {provider}"))
        })
    }
}

#[derive(Debug, Clone)]
pub struct InitiatePayment {
    pub booking_id: String,
    pub amount: i64,
    pub method: PaymentMethod,
    pub phone_number: Option<String>,
    pub return_url: Option<String>,
}

/// Result of starting a payment
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: Payment,
    /// Hosted checkout the customer must finish (Chapa)
    pub payment_url: Option<String>,
    pub message: String,
}

/// What happened to an incoming provider callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
    Applied,
    /// Same callback seen before; nothing changed
    Duplicate,
    /// Intermediate status; nothing to apply
    Ignored,
}

/// A payment together with the booking it pays for
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub payment: Payment,
    pub booking: Booking,
}

pub struct PaymentService {
    repos: Arc<dyn RepositoryProvider>,
    bookings: Arc<BookingService>,
    gateways: GatewayRegistry,
    provider_timeout: Duration,
}

impl PaymentService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        bookings: Arc<BookingService>,
        gateways: GatewayRegistry,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            repos,
            bookings,
            gateways,
            provider_timeout,
        }
    }

    pub async fn initiate_payment(&self, request: InitiatePayment) -> DomainResult<PaymentOutcome> {
        if request.amount <= 0 {
            return Err(DomainError::Validation("amount must be positive".to_string()));
        }

        let booking = self.bookings.get_booking(&request.booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "Booking {} is not awaiting payment (status: {})",
                booking.id, booking.status
            )));
        }
        if request.amount < booking.total_amount {
            return Err(DomainError::Validation(format!(
                "amount {} does not cover booking total {}",
                request.amount, booking.total_amount
            )));
        }

        let payment = Payment::new(&booking.id, &booking.user_id, request.amount, request.method);
        self.repos.payments().save(payment.clone()).await?;
        info!(
            payment_id = %payment.id,
            booking_id = %booking.id,
            method = %request.method,
            amount = request.amount,
            "Payment initiated"
        );

        match request.method.provider() {
            None => self.await_cash(payment).await,
            Some(provider) => self.charge(payment, provider, &request).await,
        }
    }

    async fn await_cash(&self, mut payment: Payment) -> DomainResult<PaymentOutcome> {
        let record = json!({ "method": "CASH", "note": "Awaiting cash payment confirmation" });
        payment.await_confirmation(record.to_string(), Utc::now())?;
        self.repos.payments().update(payment.clone()).await?;

        Ok(PaymentOutcome {
            payment,
            payment_url: None,
            message: "Cash payment - please pay at the parking location".to_string(),
        })
    }

    async fn charge(
        &self,
        mut payment: Payment,
        provider: PaymentProvider,
        request: &InitiatePayment,
    ) -> DomainResult<PaymentOutcome> {
        let method = payment.method.display_name();
        let gateway = match self.gateways.get(provider) {
            Ok(gateway) => gateway,
            Err(e) => {
                self.fail_payment(&mut payment, None).await?;
                return Err(e);
            }
        };

        payment.mark_processing(Utc::now())?;
        self.repos.payments().update(payment.clone()).await?;

        let gateway_request = GatewayRequest {
            reference: payment.id.clone(),
            amount: payment.amount,
            phone_number: request.phone_number.clone(),
            return_url: request.return_url.clone(),
        };

        let response = match self.call_gateway(gateway.as_ref(), &gateway_request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(payment_id = %payment.id, provider = %provider, error = %e, "Provider call failed");
                self.fail_payment(&mut payment, None).await?;
                return Err(DomainError::Provider(format!(
                    "{method} payment processing failed: {e}"
                )));
            }
        };

        if !response.success {
            self.fail_payment(&mut payment, Some(response.raw_string())).await?;
            let message = match provider {
                PaymentProvider::Chapa => "Failed to initiate Chapa payment".to_string(),
                _ => format!("{method} payment failed"),
            };
            return Ok(PaymentOutcome {
                payment,
                payment_url: None,
                message,
            });
        }

        if provider == PaymentProvider::Chapa {
            payment.await_confirmation(response.raw_string(), Utc::now())?;
            self.repos.payments().update(payment.clone()).await?;
            return Ok(PaymentOutcome {
                payment,
                payment_url: response.payment_url,
                message: "Please complete payment on Chapa".to_string(),
            });
        }

        payment.complete(response.transaction_id.clone(), response.raw_string(), Utc::now())?;
        self.repos.payments().update(payment.clone()).await?;
        metrics::counter!("payments_total", "method" => payment.method.as_str(), "status" => "COMPLETED")
            .increment(1);
        info!(payment_id = %payment.id, transaction_id = ?payment.transaction_id, "Payment completed");

        self.bookings
            .confirm_booking_payment(&payment.booking_id, &payment.id)
            .await?;

        Ok(PaymentOutcome {
            payment,
            payment_url: None,
            message: format!("Payment successful via {method}"),
        })
    }

    async fn call_gateway(
        &self,
        gateway: &dyn PaymentGateway,
        request: &GatewayRequest,
    ) -> DomainResult<GatewayResponse> {
        match tokio::time::timeout(self.provider_timeout, gateway.charge(request)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::Provider(format!(
                "no answer within {}s",
                self.provider_timeout.as_secs_f64()
            ))),
        }
    }

    async fn fail_payment(&self, payment: &mut Payment, raw: Option<String>) -> DomainResult<()> {
        payment.fail(raw, Utc::now())?;
        self.repos.payments().update(payment.clone()).await?;
        metrics::counter!("payments_total", "method" => payment.method.as_str(), "status" => "FAILED")
            .increment(1);
        Ok(())
    }

    /// Attendant confirms that cash was received. Repeating the call on a
    /// completed payment changes nothing.
    pub async fn confirm_cash_payment(&self, payment_id: &str, attendant_id: &str) -> DomainResult<Payment> {
        let mut payment = self.find_payment(payment_id).await?;

        if payment.method != PaymentMethod::Cash {
            return Err(DomainError::Validation(format!(
                "Payment {} is not a cash payment",
                payment.id
            )));
        }
        if payment.status == PaymentStatus::Completed {
            debug!(payment_id, "Cash payment already confirmed");
            return Ok(payment);
        }
        if payment.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "Cash payment {} cannot be confirmed (status: {})",
                payment.id, payment.status
            )));
        }

        let now = Utc::now();
        let record = json!({
            "method": "CASH",
            "confirmedBy": attendant_id,
            "confirmedAt": now,
        });
        payment.complete(None, record.to_string(), now)?;
        self.repos.payments().update(payment.clone()).await?;
        metrics::counter!("payments_total", "method" => "CASH", "status" => "COMPLETED").increment(1);
        info!(payment_id, attendant_id, "Cash payment confirmed");

        self.bookings
            .confirm_booking_payment(&payment.booking_id, &payment.id)
            .await?;
        Ok(payment)
    }

    /// Apply a provider callback. Each (provider, transaction) pair is
    /// applied at most once; replays are acknowledged as duplicates.
    pub async fn handle_payment_webhook(&self, provider: &str, payload: Value) -> DomainResult<WebhookAck> {
        let provider = PaymentProvider::from_slug(provider).ok_or_else(|| {
            DomainError::Validation(format!("Unknown payment provider: {provider}"))
        })?;
        let event = WebhookEvent::parse(provider, &payload)?;

        if event.outcome == WebhookOutcome::Pending {
            debug!(provider = %provider, reference = %event.reference, "Intermediate webhook ignored");
            return Ok(WebhookAck::Ignored);
        }

        let payment = self.find_payment(&event.reference).await?;
        let event_key = event.dedup_key();

        let first_delivery = self
            .repos
            .payments()
            .record_webhook(ProcessedWebhook {
                provider,
                event_key: event_key.clone(),
                payment_id: payment.id.clone(),
                received_at: Utc::now(),
            })
            .await?;
        if !first_delivery {
            metrics::counter!("webhooks_duplicate_total", "provider" => provider.slug()).increment(1);
            info!(provider = %provider, event_key = %event_key, "Duplicate webhook ignored");
            return Ok(WebhookAck::Duplicate);
        }

        if let Err(e) = self.apply_webhook(payment, &event, &payload).await {
            // let the provider redeliver
            self.repos
                .payments()
                .forget_webhook(provider.slug(), &event_key)
                .await?;
            return Err(e);
        }
        Ok(WebhookAck::Applied)
    }

    async fn apply_webhook(&self, mut payment: Payment, event: &WebhookEvent, payload: &Value) -> DomainResult<()> {
        let now = Utc::now();
        match event.outcome {
            WebhookOutcome::Succeeded => {
                if payment.status != PaymentStatus::Completed {
                    payment.complete(event.transaction_id.clone(), payload.to_string(), now)?;
                    self.repos.payments().update(payment.clone()).await?;
                    metrics::counter!("payments_total", "method" => payment.method.as_str(), "status" => "COMPLETED")
                        .increment(1);
                    info!(payment_id = %payment.id, provider = %event.provider, "Payment completed by webhook");
                }

                let booking = self.bookings.get_booking(&payment.booking_id).await?;
                match booking.status {
                    BookingStatus::Pending => {
                        self.bookings
                            .confirm_booking_payment(&booking.id, &payment.id)
                            .await?;
                    }
                    BookingStatus::Confirmed => {}
                    other => warn!(
                        booking_id = %booking.id,
                        status = %other,
                        payment_id = %payment.id,
                        "Payment completed for a booking that can no longer be confirmed"
                    ),
                }
            }
            WebhookOutcome::Failed => {
                if payment.status.is_open() {
                    self.fail_payment(&mut payment, Some(payload.to_string())).await?;
                    info!(payment_id = %payment.id, provider = %event.provider, "Payment failed by webhook");
                } else {
                    debug!(payment_id = %payment.id, status = %payment.status, "Failure webhook for settled payment");
                }
            }
            WebhookOutcome::Pending => {}
        }
        Ok(())
    }

    pub async fn get_payment_status(&self, payment_id: &str) -> DomainResult<PaymentDetails> {
        let payment = self.find_payment(payment_id).await?;
        let booking = self.bookings.get_booking(&payment.booking_id).await?;
        Ok(PaymentDetails { payment, booking })
    }

    async fn find_payment(&self, payment_id: &str) -> DomainResult<Payment> {
        self.repos
            .payments()
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment", "id", payment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::Fixture;
    use crate::domain::SlotStatus;
    use crate::infrastructure::gateways::SimulatedGateway;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    struct BrokenGateway;

    #[async_trait]
    impl PaymentGateway for BrokenGateway {
        fn provider(&self) -> PaymentProvider {
            PaymentProvider::CbeBirr
        }

        async fn charge(&self, _request: &GatewayRequest) -> DomainResult<GatewayResponse> {
            Err(DomainError::Provider("connection reset".to_string()))
        }
    }

    fn instant(provider: PaymentProvider, success_rate: f64) -> Arc<dyn PaymentGateway> {
        Arc::new(SimulatedGateway::new(provider, success_rate, Duration::ZERO))
    }

    fn service(fx: &Fixture, gateways: GatewayRegistry) -> PaymentService {
        PaymentService::new(fx.repos.clone(), fx.bookings.clone(), gateways, Duration::from_secs(5))
    }

    fn approving() -> GatewayRegistry {
        GatewayRegistry::new()
            .register(instant(PaymentProvider::Telebirr, 1.0))
            .register(instant(PaymentProvider::CbeBirr, 1.0))
            .register(instant(PaymentProvider::Chapa, 1.0))
    }

    fn pay_request(booking: &Booking, method: PaymentMethod) -> InitiatePayment {
        InitiatePayment {
            booking_id: booking.id.clone(),
            amount: booking.total_amount,
            method,
            phone_number: Some("+251911000000".to_string()),
            return_url: None,
        }
    }

    async fn pending_booking(fx: &Fixture) -> Booking {
        let start = Utc::now() + ChronoDuration::hours(2);
        fx.book(start, start + ChronoDuration::hours(2), 1350).await
    }

    #[tokio::test]
    async fn booking_lifecycle_end_to_end() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let start = Utc::now() + ChronoDuration::hours(2);
        let booking = fx.book(start, start + ChronoDuration::hours(2), 1350).await;

        let outcome = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Telebirr))
            .await
            .unwrap();
        assert_eq!(outcome.payment.status, PaymentStatus::Completed);
        assert_eq!(outcome.message, "Payment successful via Telebirr");
        assert!(outcome.payment.transaction_id.is_some());

        let confirmed = fx.bookings.get_booking(&booking.id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let details = fx
            .bookings
            .check_in_at(&booking.qr_code, Some("attendant-1"), start)
            .await
            .unwrap();
        assert_eq!(details.booking.status, BookingStatus::Active);
        assert_eq!(fx.slot_status().await, SlotStatus::Occupied);

        let result = fx
            .bookings
            .check_out_at(&booking.id, start + ChronoDuration::minutes(150))
            .await
            .unwrap();
        assert_eq!(result.summary.additional_charges, 675);
        assert_eq!(result.summary.total_amount, 2025);
        assert_eq!(result.booking.status, BookingStatus::Completed);
        assert_eq!(fx.slot_status().await, SlotStatus::Available);
    }

    #[tokio::test]
    async fn declined_payment_is_failed_and_booking_stays_pending() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, GatewayRegistry::new().register(instant(PaymentProvider::CbeBirr, 0.0)));
        let booking = pending_booking(&fx).await;

        let outcome = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::CbeBirr))
            .await
            .unwrap();
        assert_eq!(outcome.payment.status, PaymentStatus::Failed);
        assert_eq!(outcome.message, "CBE Birr payment failed");
        assert!(outcome
            .payment
            .gateway_response
            .unwrap()
            .contains("Transaction declined by bank"));

        let stored = fx.bookings.get_booking(&booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn provider_error_marks_payment_failed() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, GatewayRegistry::new().register(Arc::new(BrokenGateway)));
        let booking = pending_booking(&fx).await;

        let err = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::CbeBirr))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Provider(_)));

        let payment = fx.repos.payments().find_by_booking(&booking.id).await.unwrap()[0].clone();
        assert_eq!(payment.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn provider_timeout_marks_payment_failed() {
        let fx = Fixture::new(675).await;
        let slow = Arc::new(SimulatedGateway::new(
            PaymentProvider::Telebirr,
            1.0,
            Duration::from_millis(500),
        ));
        let payments = PaymentService::new(
            fx.repos.clone(),
            fx.bookings.clone(),
            GatewayRegistry::new().register(slow),
            Duration::from_millis(20),
        );
        let booking = pending_booking(&fx).await;

        let err = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Telebirr))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Provider(_)));

        let payment = fx.repos.payments().find_by_booking(&booking.id).await.unwrap()[0].clone();
        assert_eq!(payment.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn payment_requires_pending_booking_and_positive_amount() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let booking = pending_booking(&fx).await;

        let mut request = pay_request(&booking, PaymentMethod::Telebirr);
        request.amount = 0;
        assert!(matches!(
            payments.initiate_payment(request).await,
            Err(DomainError::Validation(_))
        ));

        let mut short = pay_request(&booking, PaymentMethod::Telebirr);
        short.amount = booking.total_amount - 1;
        assert!(matches!(
            payments.initiate_payment(short).await,
            Err(DomainError::Validation(_))
        ));

        payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Telebirr))
            .await
            .unwrap();
        assert!(matches!(
            payments
                .initiate_payment(pay_request(&booking, PaymentMethod::Telebirr))
                .await,
            Err(DomainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn cash_payment_waits_for_attendant_and_confirmation_is_idempotent() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let booking = pending_booking(&fx).await;

        let outcome = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(outcome.payment.status, PaymentStatus::Pending);
        assert!(outcome
            .payment
            .gateway_response
            .as_deref()
            .unwrap()
            .contains("Awaiting cash payment confirmation"));

        let confirmed = payments
            .confirm_cash_payment(&outcome.payment.id, "attendant-1")
            .await
            .unwrap();
        assert_eq!(confirmed.status, PaymentStatus::Completed);
        assert!(confirmed.gateway_response.unwrap().contains("attendant-1"));
        assert_eq!(
            fx.bookings.get_booking(&booking.id).await.unwrap().status,
            BookingStatus::Confirmed
        );

        let again = payments
            .confirm_cash_payment(&outcome.payment.id, "attendant-2")
            .await
            .unwrap();
        assert_eq!(again.paid_at, confirmed.paid_at);
        assert!(again.gateway_response.unwrap().contains("attendant-1"));
    }

    #[tokio::test]
    async fn cash_confirmation_rejects_provider_payments() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let booking = pending_booking(&fx).await;
        let outcome = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Telebirr))
            .await
            .unwrap();

        let err = payments
            .confirm_cash_payment(&outcome.payment.id, "attendant-1")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn chapa_checkout_completes_through_webhook() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let booking = pending_booking(&fx).await;

        let outcome = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Chapa))
            .await
            .unwrap();
        assert_eq!(outcome.payment.status, PaymentStatus::Pending);
        assert!(outcome.payment_url.is_some());
        assert_eq!(
            fx.bookings.get_booking(&booking.id).await.unwrap().status,
            BookingStatus::Pending
        );

        let payload = json!({
            "reference": outcome.payment.id,
            "status": "success",
            "transaction_id": "CH-778",
        });
        let ack = payments
            .handle_payment_webhook("chapa", payload.clone())
            .await
            .unwrap();
        assert_eq!(ack, WebhookAck::Applied);

        let details = payments.get_payment_status(&outcome.payment.id).await.unwrap();
        assert_eq!(details.payment.status, PaymentStatus::Completed);
        assert_eq!(details.payment.transaction_id.as_deref(), Some("CH-778"));
        assert_eq!(details.booking.status, BookingStatus::Confirmed);

        let replay = payments.handle_payment_webhook("chapa", payload).await.unwrap();
        assert_eq!(replay, WebhookAck::Duplicate);
    }

    #[tokio::test]
    async fn chapa_webhook_confirms_after_customer_switched_to_cash() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let booking = pending_booking(&fx).await;

        let chapa = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Chapa))
            .await
            .unwrap();
        let cash = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(cash.payment.status, PaymentStatus::Pending);

        let ack = payments
            .handle_payment_webhook(
                "chapa",
                json!({ "reference": chapa.payment.id, "status": "success", "transaction_id": "CH-1" }),
            )
            .await
            .unwrap();
        assert_eq!(ack, WebhookAck::Applied);

        let details = payments.get_payment_status(&chapa.payment.id).await.unwrap();
        assert_eq!(details.payment.status, PaymentStatus::Completed);
        assert_eq!(details.booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn failure_webhook_fails_open_payment() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());
        let booking = pending_booking(&fx).await;
        let outcome = payments
            .initiate_payment(pay_request(&booking, PaymentMethod::Chapa))
            .await
            .unwrap();

        let ack = payments
            .handle_payment_webhook(
                "chapa",
                json!({ "reference": outcome.payment.id, "status": "failed" }),
            )
            .await
            .unwrap();
        assert_eq!(ack, WebhookAck::Applied);

        let details = payments.get_payment_status(&outcome.payment.id).await.unwrap();
        assert_eq!(details.payment.status, PaymentStatus::Failed);
        assert_eq!(details.booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn webhook_rejects_unknown_provider_and_payment() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());

        let err = payments
            .handle_payment_webhook("paypal", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = payments
            .handle_payment_webhook(
                "telebirr",
                json!({ "outTradeNo": "missing", "tradeStatus": "Completed", "transactionNo": "TB-1" }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn intermediate_webhook_is_ignored() {
        let fx = Fixture::new(675).await;
        let payments = service(&fx, approving());

        let ack = payments
            .handle_payment_webhook(
                "cbe",
                json!({ "reference": "anything", "status": "QUEUED", "transactionId": "CBE-1" }),
            )
            .await
            .unwrap();
        assert_eq!(ack, WebhookAck::Ignored);
    }
}
