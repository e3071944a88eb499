//! # Engine Error Types
//!
//! One error type for every service operation, classified into the
//! caller-facing [`ErrorKind`] taxonomy.
//!
//! ```text
//! CoreError  ──► kind() as declared in taquilla-core
//! DbError    ──► NotFound                      → NotFound
//!                DuplicateQueue / DuplicateTurn
//!                / UniqueViolation             → Conflict
//!                anything else                 → Internal
//! ```

use taquilla_core::{CoreError, ErrorKind, ValidationError};
use taquilla_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl EngineError {
    /// Classifies the error for callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(err) => err.kind(),
            EngineError::Storage(DbError::NotFound { .. }) => ErrorKind::NotFound,
            EngineError::Storage(err) if err.is_unique_violation() => ErrorKind::Conflict,
            EngineError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Core(err) => match err {
                CoreError::EventNotFound(_) => "EVENT_NOT_FOUND",
                CoreError::QueueNotFound(_) => "QUEUE_NOT_FOUND",
                CoreError::TurnNotFound { .. } => "TURN_NOT_FOUND",
                CoreError::ZoneNotFound { .. } => "ZONE_NOT_FOUND",
                CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
                CoreError::QueueAlreadyExists(_) => "QUEUE_ALREADY_EXISTS",
                CoreError::QueueClosed(_) => "QUEUE_CLOSED",
                CoreError::NotAdmitted { .. } => "NOT_ADMITTED",
                CoreError::NotOnSale(_) => "NOT_ON_SALE",
                CoreError::SoldOut { .. } => "SOLD_OUT",
                CoreError::TicketLimitExceeded { .. } => "TICKET_LIMIT_EXCEEDED",
                CoreError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
                CoreError::OrderAlreadyCompleted(_) => "ORDER_ALREADY_COMPLETED",
                CoreError::Validation(_) => "VALIDATION_ERROR",
            },
            EngineError::Storage(DbError::NotFound { .. }) => "NOT_FOUND",
            EngineError::Storage(err) if err.is_unique_violation() => "CONFLICT",
            EngineError::Storage(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        let err = EngineError::from(DbError::DuplicateTurn);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), "CONFLICT");

        // Only reachable when a guarded update is bypassed
        let err = EngineError::from(DbError::CapacityExceeded);
        assert_eq!(err.kind(), ErrorKind::Internal);

        let err = EngineError::from(DbError::not_found("Order", "o1"));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = EngineError::from(DbError::PoolExhausted);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_core_classification() {
        let err = EngineError::from(CoreError::SoldOut {
            zone_id: "z".into(),
            available: 0,
            requested: 1,
        });
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), "SOLD_OUT");

        let err = EngineError::from(ValidationError::Required {
            field: "lines".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
