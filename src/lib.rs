//! # WayPark Parking Service
//!
//! Parking slot reservations with provider payments and attendant check-in.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: slots, bookings, payments, their state machines and repository traits
//! - **application**: booking lifecycle, payment adapter, codes, scheduler
//! - **infrastructure**: SeaORM persistence, in-memory storage, provider gateways
//! - **interfaces**: REST API with Swagger documentation
//! - **notifications**: broadcast bus behind the notification sink
//! - **shared**: errors and shutdown coordination

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::http::{create_api_router, ApiContext};

pub use notifications::{create_event_bus, spawn_log_subscriber, Event, EventBus, SharedEventBus};
