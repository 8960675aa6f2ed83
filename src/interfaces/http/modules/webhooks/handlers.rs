//! Webhook HTTP handler
//!
//! Providers call back without a user identity, so this route sits outside
//! the caller-identity middleware.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::application::{PaymentService, WebhookAck};
use crate::interfaces::http::common::{ApiResponse, ApiResult, AppError};

#[derive(Clone)]
pub struct WebhookAppState {
    pub payments: Arc<PaymentService>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WebhookQuery {
    /// telebirr, cbe or chapa
    pub provider: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    /// applied, duplicate or ignored
    pub status: String,
}

/// Provider callback; the JSON body uses the provider's own field names
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payments",
    tag = "Webhooks",
    params(WebhookQuery),
    responses(
        (status = 200, description = "Callback accepted", body = ApiResponse<WebhookResponse>),
        (status = 400, description = "Unknown provider or malformed payload"),
        (status = 404, description = "Referenced payment not found")
    )
)]
pub async fn payment_webhook(
    State(state): State<WebhookAppState>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<Value>,
) -> ApiResult<WebhookResponse> {
    let provider = query
        .provider
        .ok_or_else(|| AppError::BadRequest("provider query parameter is required".to_string()))?;

    let ack = state
        .payments
        .handle_payment_webhook(&provider.to_ascii_lowercase(), payload)
        .await?;
    let status = match ack {
        WebhookAck::Applied => "applied",
        WebhookAck::Duplicate => "duplicate",
        WebhookAck::Ignored => "ignored",
    };
    Ok(Json(ApiResponse::success(WebhookResponse {
        status: status.to_string(),
    })))
}
