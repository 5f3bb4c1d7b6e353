//! Query execution with code-keyed retries.
//!
//! The executor re-issues a failing statement on the same leased connection
//! while the driver's error code is retryable and the retry budget allows.

mod error;
mod executor;
mod result;

pub use error::{QueryError, QueryResult};
pub use executor::RetryingExecutor;
pub use result::{ResultSet, Row};
