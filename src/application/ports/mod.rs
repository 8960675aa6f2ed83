pub mod outbound;

pub use outbound::{GatewayRequest, GatewayResponse, NotificationSink, PaymentGateway};
