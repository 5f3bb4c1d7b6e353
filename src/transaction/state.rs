//! Transaction state of a leased connection.

use std::fmt;

use serde::Serialize;

/// Whether a transaction is open on the leased connection.
///
/// Only exists alongside a held connection; releasing the connection drops
/// the state with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionState {
    /// No transaction is open.
    #[default]
    Inactive,
    /// A transaction is open and must be committed or rolled back.
    Active,
}

impl TransactionState {
    /// Check if a transaction is open.
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Inactive => write!(f, "inactive"),
            TransactionState::Active => write!(f, "active"),
        }
    }
}
