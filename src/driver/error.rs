//! Errors reported by the pool and driver collaborators.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// An error reported by the database driver.
///
/// The `code` is the driver's classifier (e.g. `ER_LOCK_DEADLOCK`,
/// `LOCK_TIMEOUT`) and is what retry policies match against.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct DriverError {
    /// Driver error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl DriverError {
    /// Create a new driver error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The driver error code.
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Errors raised while acquiring a connection from the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Every connection is leased and the pool cannot grow.
    #[error("connection pool exhausted ({max_connections} connections in use)")]
    Exhausted { max_connections: usize },

    /// The database could not be reached.
    #[error("database unreachable: {0}")]
    Unreachable(String),

    /// The driver refused the connection.
    #[error("connection refused: {0}")]
    Driver(#[from] DriverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::new("LOCK_TIMEOUT", "lock wait timeout exceeded");
        assert_eq!(err.to_string(), "LOCK_TIMEOUT: lock wait timeout exceeded");
        assert_eq!(err.code(), "LOCK_TIMEOUT");
    }

    #[test]
    fn test_pool_error_from_driver() {
        let err: PoolError = DriverError::new("ECONNREFUSED", "refused").into();
        assert!(matches!(err, PoolError::Driver(_)));
        assert_eq!(err.to_string(), "connection refused: ECONNREFUSED: refused");
    }
}
