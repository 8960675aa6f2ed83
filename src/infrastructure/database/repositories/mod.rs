//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod location_repository;
pub mod payment_repository;
pub mod repository_provider;
pub mod slot_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
