//! WayPark parking service
//!
//! REST API for slot booking, payments and attendant check-in.
//! Reads configuration from TOML file (~/.config/waypark/config.toml).

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use waypark::application::{
    start_scheduler_task, BookingService, CodeGenerator, GatewayRegistry, PaymentService, Scheduler,
};
use waypark::config::AppConfig;
use waypark::domain::{ParkingLocation, ParkingSlot, PaymentProvider, RepositoryProvider};
use waypark::infrastructure::SimulatedGateway;
use waypark::shared::ShutdownCoordinator;
use waypark::{
    create_api_router, create_event_bus, default_config_path, init_database, run_migrations,
    spawn_log_subscriber, ApiContext, SeaOrmRepositoryProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = default_config_path();
    let (app_cfg, config_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(&app_cfg);
    match config_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting WayPark parking service...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()?;
    info!("Prometheus metrics recorder installed");

    // ── Database ───────────────────────────────────────────────
    let db_config = app_cfg.database.to_database_config();
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = run_migrations(&db).await {
        error!("{}", e);
        return Err(e.into());
    }

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    if app_cfg.database.seed_demo_data {
        seed_demo_data(repos.as_ref()).await;
    }

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── Notifications ──────────────────────────────────────────
    let event_bus = create_event_bus();
    let log_subscriber = spawn_log_subscriber(&event_bus, shutdown_signal.clone());
    info!("Event bus initialized");

    // ── Services ───────────────────────────────────────────────
    let bookings = Arc::new(BookingService::new(
        repos.clone(),
        Arc::new(CodeGenerator::new(app_cfg.codes.qr_secret.clone())),
        event_bus.clone(),
        app_cfg.booking.policy(),
    ));

    let payments_cfg = &app_cfg.payments;
    let gateways = GatewayRegistry::new()
        .register(Arc::new(SimulatedGateway::new(
            PaymentProvider::Telebirr,
            payments_cfg.telebirr.success_rate,
            Duration::from_millis(payments_cfg.telebirr.latency_ms),
        )))
        .register(Arc::new(SimulatedGateway::new(
            PaymentProvider::CbeBirr,
            payments_cfg.cbe.success_rate,
            Duration::from_millis(payments_cfg.cbe.latency_ms),
        )))
        .register(Arc::new(SimulatedGateway::new(
            PaymentProvider::Chapa,
            payments_cfg.chapa.success_rate,
            Duration::from_millis(payments_cfg.chapa.latency_ms),
        )));
    warn!("Payment providers are simulated; no real charges are made");

    let payments = Arc::new(PaymentService::new(
        repos.clone(),
        bookings.clone(),
        gateways,
        payments_cfg.provider_timeout(),
    ));

    // ── Scheduler ──────────────────────────────────────────────
    let scheduler_task = if app_cfg.scheduler.enabled {
        let scheduler = Arc::new(Scheduler::new(
            repos.clone(),
            bookings.clone(),
            event_bus.clone(),
            app_cfg.scheduler.windows(),
        ));
        Some(start_scheduler_task(
            scheduler,
            shutdown_signal.clone(),
            app_cfg.scheduler.interval_secs,
        ))
    } else {
        info!("Booking scheduler disabled");
        None
    };

    // ── REST API ───────────────────────────────────────────────
    let api_router = create_api_router(ApiContext {
        repos,
        bookings,
        payments,
        db: db.clone(),
        metrics: prometheus_handle,
    });

    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("REST API server received shutdown signal");
    });

    if let Err(e) = api_server.await {
        error!("REST API server error: {}", e);
        shutdown_signal.trigger();
    }

    // ── Cleanup ────────────────────────────────────────────────
    let finished = shutdown
        .shutdown_with_cleanup(|| async move {
            if let Some(task) = scheduler_task {
                if let Err(e) = task.await {
                    warn!("Scheduler task ended abnormally: {}", e);
                }
            }
            if let Err(e) = log_subscriber.await {
                warn!("Notification subscriber ended abnormally: {}", e);
            }
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("Database connection closed");
            }
        })
        .await;
    if !finished {
        warn!("Some background work did not finish before the shutdown timeout");
    }

    info!("WayPark parking service shutdown complete");
    Ok(())
}

fn init_logging(cfg: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cfg.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Insert one demo location with a handful of slots into an empty database
async fn seed_demo_data(repos: &dyn RepositoryProvider) {
    match repos.slots().count().await {
        Ok(0) => {}
        Ok(_) => return,
        Err(e) => {
            error!("Failed to count parking slots: {}", e);
            return;
        }
    }

    info!("Seeding demo parking location...");
    let location = ParkingLocation::new("Bole Medhanialem", "Bole Road, Addis Ababa");
    let location_id = location.id.clone();
    if let Err(e) = repos.locations().save(location).await {
        error!("Failed to seed parking location: {}", e);
        return;
    }

    for (number, base_price) in [("A-01", 675), ("A-02", 675), ("A-03", 850), ("B-01", 500)] {
        if let Err(e) = repos
            .slots()
            .save(ParkingSlot::new(&location_id, number, base_price))
            .await
        {
            error!("Failed to seed slot {}: {}", number, e);
            return;
        }
    }
    info!("Demo data seeded");
}
