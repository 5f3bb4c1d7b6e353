//! Transaction control for a leased connection.
//!
//! # State machine
//!
//! ```text
//!            begin()                 commit() ok
//!  Inactive ─────────▶ Active ───────────────────▶ Inactive
//!                        │
//!                        │ rollback(), commit() failure,
//!                        │ terminal query failure
//!                        ▼
//!                     Inactive
//! ```
//!
//! Rollback clears the state before the driver call completes, so a second
//! rollback reports "no transaction" instead of rolling back twice.
//!
//! # Usage
//!
//! ```ignore
//! let mut lease = ConnectionLease::new();
//! lease.acquire(&pool, false).await?;
//!
//! lease.transaction().begin().await?;
//! // ... queries ...
//! lease.transaction().commit().await?;
//! ```

mod controller;
mod error;
mod state;

pub use controller::TransactionController;
pub use error::{TransactionError, TransactionResult};
pub use state::TransactionState;
