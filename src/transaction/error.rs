//! Transaction error types.

use thiserror::Error;

use crate::driver::DriverError;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Errors that can occur during transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// No connection is leased, or rollback found nothing to roll back.
    #[error("Connection Doesn't Exist")]
    NoConnection,

    /// Commit was requested without a leased connection and an open transaction.
    #[error("Connection or Transaction Doesn't Exist")]
    NotActive,

    /// A transaction is already open on this connection.
    #[error("transaction already active on connection {connection_id}")]
    AlreadyActive { connection_id: u64 },

    /// The driver failed to begin the transaction.
    #[error(transparent)]
    Begin(DriverError),

    /// The driver failed to commit; the transaction has been rolled back.
    #[error(transparent)]
    Commit(DriverError),

    /// The driver failed to roll back.
    #[error(transparent)]
    Rollback(DriverError),
}

impl TransactionError {
    /// The driver error behind this failure, if the driver reported one.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            TransactionError::Begin(e)
            | TransactionError::Commit(e)
            | TransactionError::Rollback(e) => Some(e),
            TransactionError::NoConnection
            | TransactionError::NotActive
            | TransactionError::AlreadyActive { .. } => None,
        }
    }

    /// Check if this is the not-found condition reported by rollback.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransactionError::NoConnection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_messages() {
        assert_eq!(
            TransactionError::NoConnection.to_string(),
            "Connection Doesn't Exist"
        );
        assert_eq!(
            TransactionError::NotActive.to_string(),
            "Connection or Transaction Doesn't Exist"
        );
    }

    #[test]
    fn test_driver_errors_are_transparent() {
        let err = TransactionError::Commit(DriverError::new("ER_COMMIT", "commit failed"));
        assert_eq!(err.to_string(), "ER_COMMIT: commit failed");
        assert_eq!(err.driver_error().map(|e| e.code()), Some("ER_COMMIT"));
        assert!(TransactionError::NotActive.driver_error().is_none());
    }
}
