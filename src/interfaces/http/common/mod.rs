//! Shared HTTP building blocks: response envelope, error mapping, extractors

mod api_response;
mod app_error;
mod validated_json;

pub use api_response::{ApiResponse, EmptyData};
pub use app_error::{ApiResult, AppError};
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
