//! Retry configuration for query execution.
//!
//! A [`RetryPolicy`] is fixed when the controller is built; each
//! [`QueryRequest`] may widen the set of retryable codes for that call only.

mod policy;
mod request;

pub use policy::RetryPolicy;
pub use request::QueryRequest;
