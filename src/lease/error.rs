//! Lease ownership errors.

use thiserror::Error;

use crate::driver::PoolError;
use crate::transaction::TransactionError;

/// Result type for lease operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// An operation needed a leased connection and found the wrong ownership.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// No connection is currently leased.
    #[error("Connection Doesn't Exist")]
    ConnectionNotFound,

    /// A connection is already leased by this instance.
    #[error("connection {connection_id} is already leased")]
    AlreadyLeased { connection_id: u64 },
}

/// Result type for acquiring a lease.
pub type LeaseResult<T> = Result<T, LeaseError>;

/// Errors raised while acquiring a lease.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseError {
    /// The pool could not provide a connection.
    #[error(transparent)]
    Acquisition(#[from] PoolError),

    /// The connection was leased but its transaction failed to begin.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}
