//! Exclusive ownership of one pooled connection.
//!
//! A [`ConnectionLease`] holds at most one connection at a time together with
//! that connection's transaction state. Because the state lives inside the
//! held-connection record, an active transaction cannot outlive its
//! connection.

mod error;
mod lease;

pub use error::{LeaseError, LeaseResult, ResourceError, ResourceResult};
pub use lease::{ConnectionLease, LeaseInfo, LeaseState};
