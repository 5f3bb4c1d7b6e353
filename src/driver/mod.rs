//! Pool and driver collaborators.
//!
//! The controller never talks to a database directly. It leases a
//! [`Connection`] from a [`Pool`] and drives it through these traits, so any
//! driver can be plugged in by implementing them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  acquire_connection   ┌──────────────┐
//! │   Database   │ ────────────────────▶ │     Pool     │
//! │  (facade)    │                       └──────────────┘
//! └──────────────┘                              │
//!        │ begin / query / commit / rollback    ▼
//!        └──────────────────────────────▶ ┌──────────────┐
//!                                         │  Connection  │ ── release()
//!                                         └──────────────┘
//! ```
//!
//! [`memory`] provides a scriptable in-process implementation.

mod error;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::executor::ResultSet;

pub use error::{DriverError, DriverResult, PoolError};

/// A source of leased connections.
#[async_trait]
pub trait Pool: Send + Sync {
    /// The connection type handed out by this pool.
    type Connection: Connection;

    /// Lease a connection from the pool.
    async fn acquire_connection(&self) -> Result<Self::Connection, PoolError>;
}

/// A leased driver connection.
///
/// Calls on one connection are issued strictly one after another; the
/// controller never pipelines.
#[async_trait]
pub trait Connection: Send {
    /// Identifier of the underlying physical connection.
    fn id(&self) -> u64;

    /// Start a transaction.
    async fn begin_transaction(&mut self) -> DriverResult<()>;

    /// Commit the current transaction.
    async fn commit(&mut self) -> DriverResult<()>;

    /// Roll back the current transaction.
    async fn rollback(&mut self) -> DriverResult<()>;

    /// Run a statement with positional bind values.
    async fn query(&mut self, text: &str, params: &[Value]) -> DriverResult<ResultSet>;

    /// Hand the connection back to its pool.
    fn release(self);

    /// Close the connection without returning it to the pool.
    ///
    /// Used when the connection may still carry an open transaction, so no
    /// later lease can inherit that work.
    fn discard(self);
}
