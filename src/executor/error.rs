//! Query execution errors.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::driver::DriverError;
use crate::retry::RetryPolicy;

/// Result type for query execution.
pub type QueryResult<T> = Result<T, QueryError>;

/// A statement that failed after exhausting its retries.
///
/// Displays as the driver error of the final attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source}")]
pub struct QueryError {
    /// Error reported by the last attempt.
    pub source: DriverError,
    /// Number of times the statement was sent to the driver.
    pub attempts: u32,
}

impl QueryError {
    /// Driver error code of the final attempt.
    pub fn code(&self) -> &str {
        self.source.code()
    }

    /// Check if this error's code is retryable under `policy` plus `extra`.
    pub fn is_retryable_under(&self, policy: &RetryPolicy, extra: &BTreeSet<String>) -> bool {
        policy.is_retryable(self.code(), extra)
    }
}
