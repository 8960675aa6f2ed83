//! Infrastructure layer - external concerns

pub mod database;
pub mod gateways;
pub mod storage;

pub use database::{init_database, run_migrations, DatabaseConfig, InfraError, SeaOrmRepositoryProvider};
pub use gateways::SimulatedGateway;
pub use storage::InMemoryRepositoryProvider;
