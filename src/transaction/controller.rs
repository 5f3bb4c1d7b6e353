//! Begin, commit and rollback over a connection lease.

use tracing::{debug, warn};

use super::error::{TransactionError, TransactionResult};
use super::state::TransactionState;
use crate::driver::Connection;
use crate::lease::ConnectionLease;

/// Transaction controls borrowed from a [`ConnectionLease`].
///
/// Obtained through [`ConnectionLease::transaction`]. Every transition reads
/// and writes the state stored next to the held connection.
pub struct TransactionController<'a, C: Connection> {
    lease: &'a mut ConnectionLease<C>,
}

impl<'a, C: Connection> TransactionController<'a, C> {
    pub(crate) fn new(lease: &'a mut ConnectionLease<C>) -> Self {
        Self { lease }
    }

    /// Current transaction state; `Inactive` when nothing is leased.
    pub fn state(&self) -> TransactionState {
        self.lease.held().map(|held| held.tx).unwrap_or_default()
    }

    /// Open a transaction on the leased connection.
    pub async fn begin(&mut self) -> TransactionResult<()> {
        let held = self.lease.held_mut().ok_or(TransactionError::NoConnection)?;
        let connection_id = held.conn.id();
        match held.tx {
            TransactionState::Active => {
                return Err(TransactionError::AlreadyActive { connection_id });
            }
            TransactionState::Inactive => {}
        }

        held.conn
            .begin_transaction()
            .await
            .map_err(TransactionError::Begin)?;
        held.tx = TransactionState::Active;
        debug!(lease_id = %held.lease_id, connection_id, "transaction started");
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// If the driver rejects the commit, the transaction is rolled back
    /// (best effort, failures only logged) and the commit error is returned.
    pub async fn commit(&mut self) -> TransactionResult<()> {
        let held = match self.lease.held_mut() {
            Some(held) if held.tx.is_active() => held,
            _ => return Err(TransactionError::NotActive),
        };
        let connection_id = held.conn.id();

        let outcome = held.conn.commit().await;
        match outcome {
            Ok(()) => {
                held.tx = TransactionState::Inactive;
                debug!(lease_id = %held.lease_id, connection_id, "transaction committed");
                Ok(())
            }
            Err(err) => {
                warn!(connection_id, code = %err.code(), "commit failed, rolling back");
                self.rollback().await;
                Err(TransactionError::Commit(err))
            }
        }
    }

    /// Roll back and report the outcome to `on_done`.
    ///
    /// Without a leased connection and an open transaction, `on_done`
    /// receives [`TransactionError::NoConnection`]. Nothing is returned to
    /// the caller either way.
    pub async fn rollback_with<F>(&mut self, on_done: F)
    where
        F: FnOnce(TransactionResult<()>),
    {
        on_done(self.try_rollback().await);
    }

    /// Roll back, logging rather than reporting any failure.
    pub async fn rollback(&mut self) {
        match self.try_rollback().await {
            Ok(()) => {}
            Err(TransactionError::NoConnection) => {
                debug!("rollback skipped, no open transaction");
            }
            Err(err) => warn!(error = %err, "rollback failed"),
        }
    }

    async fn try_rollback(&mut self) -> TransactionResult<()> {
        let held = match self.lease.held_mut() {
            Some(held) if held.tx.is_active() => held,
            _ => return Err(TransactionError::NoConnection),
        };

        // Cleared before the driver call so a repeat never rolls back twice.
        held.tx = TransactionState::Inactive;
        held.conn
            .rollback()
            .await
            .map_err(TransactionError::Rollback)?;
        debug!(lease_id = %held.lease_id, connection_id = held.conn.id(), "transaction rolled back");
        Ok(())
    }
}
