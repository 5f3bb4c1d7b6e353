//! txlease - leased-connection query controller
//!
//! This crate sits between application code and a pooled database
//! connection. It leases one connection at a time, tracks whether a
//! transaction is open on it, retries queries that fail with configured
//! error codes, and rolls the transaction back when a query fails for good.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use txlease::db::{ConnectionOptions, Database, DatabaseConfig};
//! use txlease::driver::memory::MemoryPool;
//!
//! # async fn run() -> txlease::db::DatabaseResult<()> {
//! let config = DatabaseConfig::new()
//!     .max_retry_count(2)
//!     .retry_error_code("LOCK_TIMEOUT");
//! let mut db = Database::new(MemoryPool::new(4), config);
//!
//! db.get_connection(ConnectionOptions::with_transaction()).await?;
//! db.execute_query("UPDATE jobs SET state = ? WHERE id = ?", &[json!("done"), json!(1)])
//!     .await?;
//! db.close().await?; // commits the open transaction, then releases
//! # Ok(())
//! # }
//! ```
//!
//! One [`db::Database`] instance is meant to be driven sequentially; every
//! operation takes `&mut self`.

pub mod db;
pub mod driver;
pub mod executor;
pub mod lease;
pub mod retry;
pub mod transaction;
