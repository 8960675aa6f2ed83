//! Payment provider clients

mod simulated;

pub use simulated::SimulatedGateway;
