//! Connection lease and its lifecycle state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use ulid::Ulid;

use super::error::{LeaseResult, ResourceError, ResourceResult};
use crate::driver::{Connection, Pool};
use crate::transaction::{TransactionController, TransactionState};

/// Lifecycle of a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaseState {
    /// No connection is held.
    Unleased,
    /// A connection is held with no open transaction.
    Leased,
    /// A connection is held and a transaction is open on it.
    InTransaction,
}

impl fmt::Display for LeaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaseState::Unleased => write!(f, "unleased"),
            LeaseState::Leased => write!(f, "leased"),
            LeaseState::InTransaction => write!(f, "in transaction"),
        }
    }
}

/// Diagnostic snapshot of the current lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInfo {
    /// Unique ID of this lease, for log correlation.
    pub lease_id: String,
    /// ID of the underlying driver connection.
    pub connection_id: u64,
    /// When the connection was acquired.
    pub acquired_at: DateTime<Utc>,
    /// Queries executed through this lease, retries excluded.
    pub queries_executed: u64,
    /// Whether a transaction is open.
    pub in_transaction: bool,
}

/// A held connection and the state tied to it.
pub(crate) struct Held<C> {
    pub(crate) conn: C,
    pub(crate) tx: TransactionState,
    pub(crate) lease_id: String,
    pub(crate) acquired_at: DateTime<Utc>,
    pub(crate) queries_executed: u64,
}

/// Owns at most one leased connection.
///
/// The connection goes back to the pool exactly once: through
/// [`release`](Self::release), or on drop if the lease is abandoned.
pub struct ConnectionLease<C: Connection> {
    held: Option<Held<C>>,
}

impl<C: Connection> ConnectionLease<C> {
    /// Create an empty lease.
    pub fn new() -> Self {
        Self { held: None }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LeaseState {
        match &self.held {
            None => LeaseState::Unleased,
            Some(held) => match held.tx {
                TransactionState::Inactive => LeaseState::Leased,
                TransactionState::Active => LeaseState::InTransaction,
            },
        }
    }

    /// Check if a connection is held.
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Snapshot of the current lease, if any.
    pub fn info(&self) -> Option<LeaseInfo> {
        self.held.as_ref().map(|held| LeaseInfo {
            lease_id: held.lease_id.clone(),
            connection_id: held.conn.id(),
            acquired_at: held.acquired_at,
            queries_executed: held.queries_executed,
            in_transaction: held.tx.is_active(),
        })
    }

    /// Lease a connection from `pool`, optionally opening a transaction.
    ///
    /// If the transaction fails to begin, the error is returned but the
    /// connection stays leased; release it with [`release`](Self::release).
    pub async fn acquire<P>(&mut self, pool: &P, want_transaction: bool) -> LeaseResult<()>
    where
        P: Pool<Connection = C>,
    {
        if let Some(held) = &self.held {
            return Err(ResourceError::AlreadyLeased {
                connection_id: held.conn.id(),
            }
            .into());
        }

        let conn = pool.acquire_connection().await?;
        let lease_id = Ulid::new().to_string().to_lowercase();
        debug!(lease_id = %lease_id, connection_id = conn.id(), "connection leased");

        self.held = Some(Held {
            conn,
            tx: TransactionState::Inactive,
            lease_id,
            acquired_at: Utc::now(),
            queries_executed: 0,
        });

        if want_transaction {
            self.transaction().begin().await?;
        }
        Ok(())
    }

    /// Return the connection to the pool.
    ///
    /// Any open transaction is dropped with the connection; the caller is
    /// expected to have committed or rolled back first.
    pub fn release(&mut self) -> ResourceResult<()> {
        let held = self.held.take().ok_or(ResourceError::ConnectionNotFound)?;
        debug!(
            lease_id = %held.lease_id,
            connection_id = held.conn.id(),
            queries = held.queries_executed,
            "connection released"
        );
        held.conn.release();
        Ok(())
    }

    /// Transaction controls for the held connection.
    pub fn transaction(&mut self) -> TransactionController<'_, C> {
        TransactionController::new(self)
    }

    /// The held connection, if any.
    pub fn connection_mut(&mut self) -> Option<&mut C> {
        self.held.as_mut().map(|held| &mut held.conn)
    }

    pub(crate) fn held(&self) -> Option<&Held<C>> {
        self.held.as_ref()
    }

    pub(crate) fn held_mut(&mut self) -> Option<&mut Held<C>> {
        self.held.as_mut()
    }

    pub(crate) fn record_query(&mut self) {
        if let Some(held) = self.held.as_mut() {
            held.queries_executed += 1;
        }
    }
}

impl<C: Connection> Default for ConnectionLease<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> Drop for ConnectionLease<C> {
    fn drop(&mut self) {
        let Some(held) = self.held.take() else {
            return;
        };
        match held.tx {
            TransactionState::Active => {
                // An open transaction must not ride back into the pool.
                warn!(
                    lease_id = %held.lease_id,
                    connection_id = held.conn.id(),
                    "lease dropped inside a transaction, discarding connection"
                );
                held.conn.discard();
            }
            TransactionState::Inactive => {
                warn!(
                    lease_id = %held.lease_id,
                    connection_id = held.conn.id(),
                    "lease dropped without close, releasing connection"
                );
                held.conn.release();
            }
        }
    }
}

impl<C: Connection> fmt::Debug for ConnectionLease<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("state", &self.state())
            .field("lease_id", &self.held.as_ref().map(|h| h.lease_id.as_str()))
            .finish()
    }
}
