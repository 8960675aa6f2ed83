use thiserror::Error;

/// Why a check-in attempt fell outside the grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("Check-in too early")]
    TooEarly,

    #[error("Booking has expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Timing(#[from] TimingError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = DomainError::not_found("Booking", "id", "b-1");
        assert_eq!(err.to_string(), "Not found: Booking with id=b-1");
    }

    #[test]
    fn timing_errors_convert() {
        let err: DomainError = TimingError::TooEarly.into();
        assert!(matches!(err, DomainError::Timing(TimingError::TooEarly)));
        assert_eq!(err.to_string(), "Check-in too early");
    }

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::Conflict("slot taken".into()).is_transient());
    }
}
