//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::middleware::{auth_middleware, staff_middleware};
use super::modules::bookings::{self, BookingAppState};
use super::modules::checkin;
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::payments::{self, PaymentAppState};
use super::modules::request_id::request_id_middleware;
use super::modules::slots::{self, SlotAppState};
use super::modules::webhooks::{self, WebhookAppState};
use crate::application::{BookingService, PaymentService};
use crate::domain::RepositoryProvider;

/// Everything the HTTP layer needs from the rest of the service
#[derive(Clone)]
pub struct ApiContext {
    pub repos: Arc<dyn RepositoryProvider>,
    pub bookings: Arc<BookingService>,
    pub payments: Arc<PaymentService>,
    pub db: DatabaseConnection,
    pub metrics: PrometheusHandle,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-User-Id",
                    "Caller id set by the upstream auth layer; X-User-Role carries ATTENDANT or ADMIN",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::extend_booking,
        bookings::cancel_booking,
        bookings::check_out,
        checkin::check_in,
        payments::initiate_payment,
        payments::get_payment,
        payments::confirm_cash_payment,
        webhooks::payment_webhook,
        slots::list_slots,
        slots::get_slot,
        slots::list_locations,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            bookings::CreateBookingRequest,
            bookings::ExtendBookingRequest,
            bookings::BookingDto,
            bookings::ExtensionResponse,
            bookings::CancellationResponse,
            bookings::CheckOutResponse,
            checkin::CheckInRequest,
            checkin::CheckInResponse,
            payments::InitiatePaymentRequest,
            payments::PaymentDto,
            payments::PaymentOutcomeResponse,
            payments::PaymentDetailsResponse,
            webhooks::WebhookResponse,
            slots::SlotDto,
            slots::LocationDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Bookings", description = "Slot reservations and their lifecycle"),
        (name = "Check-in", description = "Attendant check-in by QR payload or 6-digit code"),
        (name = "Payments", description = "Payment initiation, status and cash confirmation"),
        (name = "Webhooks", description = "Payment provider callbacks"),
        (name = "Slots", description = "Parking locations and slot ledger"),
    ),
    info(
        title = "WayPark Parking Service API",
        version = "0.1.0",
        description = "Parking slot booking, payment and check-in",
    )
)]
pub struct ApiDoc;

pub fn create_api_router(ctx: ApiContext) -> Router {
    let booking_state = BookingAppState {
        bookings: ctx.bookings.clone(),
    };

    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/extend", post(bookings::extend_booking))
        .route("/{id}/cancel", post(bookings::cancel_booking))
        .route(
            "/{id}/checkout",
            post(bookings::check_out).layer(middleware::from_fn(staff_middleware)),
        )
        .layer(middleware::from_fn(auth_middleware))
        .with_state(booking_state.clone());

    let checkin_routes = Router::new()
        .route("/", post(checkin::check_in))
        .layer(middleware::from_fn(staff_middleware))
        .with_state(booking_state);

    let payment_routes = Router::new()
        .route("/", post(payments::initiate_payment))
        .route("/{id}", get(payments::get_payment))
        .route(
            "/{id}/confirm-cash",
            post(payments::confirm_cash_payment).layer(middleware::from_fn(staff_middleware)),
        )
        .layer(middleware::from_fn(auth_middleware))
        .with_state(PaymentAppState {
            payments: ctx.payments.clone(),
            bookings: ctx.bookings.clone(),
        });

    // Provider callbacks carry no caller identity
    let webhook_routes = Router::new()
        .route("/payments", post(webhooks::payment_webhook))
        .with_state(WebhookAppState {
            payments: ctx.payments,
        });

    let slot_state = SlotAppState { repos: ctx.repos };
    let slot_routes = Router::new()
        .route("/", get(slots::list_slots))
        .route("/{id}", get(slots::get_slot))
        .with_state(slot_state.clone());
    let location_routes = Router::new()
        .route("/", get(slots::list_locations))
        .with_state(slot_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState {
            db: ctx.db,
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState {
            handle: ctx.metrics,
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .nest("/api/v1/bookings", booking_routes)
        .nest("/api/v1/checkin", checkin_routes)
        .nest("/api/v1/payments", payment_routes)
        .nest("/api/v1/webhooks", webhook_routes)
        .nest("/api/v1/slots", slot_routes)
        .nest("/api/v1/locations", location_routes)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::Service;

    use crate::application::{CodeGenerator, GatewayRegistry};
    use crate::domain::{BookingPolicy, ParkingLocation, ParkingSlot, PaymentProvider};
    use crate::infrastructure::{
        init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider, SimulatedGateway,
    };
    use crate::notifications::create_event_bus;

    struct TestApp {
        router: Router,
        slot: ParkingSlot,
    }

    async fn app() -> TestApp {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        let location = ParkingLocation::new("Bole Medhanialem", "Bole Road");
        let slot = ParkingSlot::new(&location.id, "A-01", 675);
        repos.locations().save(location).await.unwrap();
        repos.slots().save(slot.clone()).await.unwrap();

        let bookings = Arc::new(BookingService::new(
            repos.clone(),
            Arc::new(CodeGenerator::new("router-test")),
            create_event_bus(),
            BookingPolicy::default(),
        ));
        let gateways = GatewayRegistry::new().register(Arc::new(SimulatedGateway::new(
            PaymentProvider::Telebirr,
            1.0,
            std::time::Duration::ZERO,
        )));
        let payments = Arc::new(PaymentService::new(
            repos.clone(),
            bookings.clone(),
            gateways,
            std::time::Duration::from_secs(5),
        ));

        let router = create_api_router(ApiContext {
            repos,
            bookings,
            payments,
            db,
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        });
        TestApp { router, slot }
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        user: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder.header("x-user-id", id).header("x-user-role", role);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let mut svc = router.clone().into_service();
        let response = svc.call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    const CUSTOMER: Option<(&str, &str)> = Some(("user-1", "CUSTOMER"));
    const ATTENDANT: Option<(&str, &str)> = Some(("attendant-1", "ATTENDANT"));

    fn booking_body(slot_id: &str, start_in_minutes: i64) -> Value {
        let start = Utc::now() + Duration::minutes(start_in_minutes);
        json!({
            "slot_id": slot_id,
            "start_time": start,
            "end_time": start + Duration::hours(2),
            "total_amount": 1350,
        })
    }

    #[tokio::test]
    async fn booking_pay_check_in_check_out() {
        let t = app().await;
        let r = &t.router;

        let (status, body) = call(r, "POST", "/api/v1/bookings", CUSTOMER, Some(booking_body(&t.slot.id, 5))).await;
        assert_eq!(status, StatusCode::CREATED);
        let booking_id = body["data"]["id"].as_str().unwrap().to_string();
        let check_in_code = body["data"]["check_in_code"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["status"], "PENDING");

        let (status, body) = call(
            r,
            "POST",
            "/api/v1/payments",
            CUSTOMER,
            Some(json!({"booking_id": booking_id, "amount": 1350, "method": "TELEBIRR", "phone_number": "+251911000000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payment"]["status"], "COMPLETED");

        let (_, body) = call(r, "GET", &format!("/api/v1/bookings/{booking_id}"), CUSTOMER, None).await;
        assert_eq!(body["data"]["status"], "CONFIRMED");

        let (status, _) = call(r, "POST", "/api/v1/checkin", CUSTOMER, Some(json!({"code": check_in_code}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(r, "POST", "/api/v1/checkin", ATTENDANT, Some(json!({"code": check_in_code}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ACTIVE");
        assert_eq!(body["data"]["location_name"], "Bole Medhanialem");
        assert_eq!(body["data"]["slot_number"], "A-01");

        let (_, body) = call(r, "GET", &format!("/api/v1/slots/{}", t.slot.id), None, None).await;
        assert_eq!(body["data"]["status"], "OCCUPIED");

        let (status, body) = call(r, "POST", &format!("/api/v1/bookings/{booking_id}/checkout"), ATTENDANT, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["booking"]["status"], "COMPLETED");
        assert_eq!(body["data"]["additional_charges"], 0);

        let (_, body) = call(r, "GET", &format!("/api/v1/slots/{}", t.slot.id), None, None).await;
        assert_eq!(body["data"]["status"], "AVAILABLE");
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let t = app().await;
        let (status, body) = call(&t.router, "GET", "/api/v1/bookings", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn second_booking_on_reserved_slot_conflicts() {
        let t = app().await;
        let (status, _) = call(&t.router, "POST", "/api/v1/bookings", CUSTOMER, Some(booking_body(&t.slot.id, 60))).await;
        assert_eq!(status, StatusCode::CREATED);

        let other = Some(("user-2", "CUSTOMER"));
        let (status, body) = call(&t.router, "POST", "/api/v1/bookings", other, Some(booking_body(&t.slot.id, 60))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn other_users_cannot_read_or_cancel() {
        let t = app().await;
        let (_, body) = call(&t.router, "POST", "/api/v1/bookings", CUSTOMER, Some(booking_body(&t.slot.id, 120))).await;
        let booking_id = body["data"]["id"].as_str().unwrap().to_string();

        let other = Some(("user-2", "CUSTOMER"));
        let (status, _) = call(&t.router, "GET", &format!("/api/v1/bookings/{booking_id}"), other, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&t.router, "POST", &format!("/api/v1/bookings/{booking_id}/cancel"), other, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&t.router, "POST", &format!("/api/v1/bookings/{booking_id}/cancel"), CUSTOMER, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["booking"]["status"], "CANCELLED");
        assert_eq!(body["data"]["refund_amount"], 1350);
    }

    #[tokio::test]
    async fn request_validation() {
        let t = app().await;
        let (_, body) = call(&t.router, "POST", "/api/v1/bookings", CUSTOMER, Some(booking_body(&t.slot.id, 120))).await;
        let booking_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &t.router,
            "POST",
            &format!("/api/v1/bookings/{booking_id}/extend"),
            CUSTOMER,
            Some(json!({"additional_hours": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &t.router,
            "POST",
            "/api/v1/payments",
            CUSTOMER,
            Some(json!({"booking_id": booking_id, "amount": 1350, "method": "BITCOIN"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&t.router, "GET", "/api/v1/bookings?status=PARKED", CUSTOMER, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_requires_known_provider() {
        let t = app().await;
        let payload = Some(json!({"reference": "p-1", "status": "success"}));

        let (status, _) = call(&t.router, "POST", "/api/v1/webhooks/payments", None, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&t.router, "POST", "/api/v1/webhooks/payments?provider=paypal", None, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&t.router, "POST", "/api/v1/webhooks/payments?provider=chapa", None, payload).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_and_slot_listing() {
        let t = app().await;
        let (status, body) = call(&t.router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["status"], "ok");

        let (status, body) = call(&t.router, "GET", "/api/v1/slots?status=available", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = call(&t.router, "GET", "/api/v1/locations", None, None).await;
        assert_eq!(body["data"][0]["name"], "Bole Medhanialem");
    }
}
