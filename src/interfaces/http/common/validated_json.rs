//! JSON body extractor that also runs `validator` rules
//!
//! Malformed bodies answer 400, bodies that parse but break a rule answer
//! 422. Both use the `ApiResponse` envelope so clients see one error shape.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// `Json<T>` plus `T::validate()`; handlers only ever see valid bodies.
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    /// Body is not JSON, or does not match the request type
    Malformed(JsonRejection),
    /// Body parsed but broke at least one field rule
    Invalid(ValidationErrors),
}

/// `field: message` pairs sorted by field name, joined with `; `
fn describe(errors: &ValidationErrors) -> String {
    let by_field: BTreeMap<_, _> = errors.field_errors().into_iter().collect();
    let parts: Vec<String> = by_field
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: failed '{}'", e.code),
            })
        })
        .collect();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Malformed(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            ),
            Self::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Malformed)?;
        body.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(Self(body))
    }
}
