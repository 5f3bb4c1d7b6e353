//! High-level database API.
//!
//! [`Database`] is the single entry point calling code uses: lease a
//! connection, optionally in a transaction, run queries with retries, then
//! commit or close.

mod api;

pub use api::{
    ClosePolicy, ConnectionOptions, Database, DatabaseConfig, DatabaseError, DatabaseResult,
};
