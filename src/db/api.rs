//! Database API - the public facade over lease, transaction and executor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::driver::{Pool, PoolError};
use crate::executor::{QueryError, ResultSet, RetryingExecutor};
use crate::lease::{ConnectionLease, LeaseError, LeaseInfo, LeaseState, ResourceError};
use crate::retry::{QueryRequest, RetryPolicy};
use crate::transaction::{TransactionError, TransactionResult};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
///
/// Each variant displays as the error it wraps, so callers always see the
/// originating message.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The pool could not provide a connection.
    #[error(transparent)]
    Acquisition(#[from] PoolError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// The driver rejected a query after all retries.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No connection is leased, or one already is.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl From<LeaseError> for DatabaseError {
    fn from(err: LeaseError) -> Self {
        match err {
            LeaseError::Acquisition(e) => DatabaseError::Acquisition(e),
            LeaseError::Transaction(e) => DatabaseError::Transaction(e),
            LeaseError::Resource(e) => DatabaseError::Resource(e),
        }
    }
}

/// What `close` does with a transaction that is still open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosePolicy {
    /// Commit it; if the commit fails the connection is kept.
    #[default]
    AutoCommit,
    /// Roll it back and release regardless of the outcome.
    Rollback,
}

/// Database configuration options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Retry policy applied to every query.
    #[serde(flatten)]
    pub retry: RetryPolicy,
    /// Handling of open transactions on close.
    pub close_policy: ClosePolicy,
}

impl DatabaseConfig {
    /// Create a configuration with no retries and auto-commit on close.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON, e.g.
    /// `{"maxRetryCount": 2, "retryErrorCodes": ["LOCK_TIMEOUT"]}`.
    pub fn from_json_str(json: &str) -> DatabaseResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set max_retry_count.
    pub fn max_retry_count(mut self, value: u32) -> Self {
        self.retry = self.retry.max_retry_count(value);
        self
    }

    /// Add a retryable error code.
    pub fn retry_error_code(mut self, code: impl Into<String>) -> Self {
        self.retry = self.retry.retry_error_code(code);
        self
    }

    /// Replace the whole retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set close_policy.
    pub fn close_policy(mut self, value: ClosePolicy) -> Self {
        self.close_policy = value;
        self
    }
}

/// Options for [`Database::get_connection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Begin a transaction right after acquiring.
    pub transaction: bool,
}

impl ConnectionOptions {
    /// Options that open a transaction on the new connection.
    pub fn with_transaction() -> Self {
        Self { transaction: true }
    }
}

/// The main database handle.
///
/// Owns at most one leased connection. Every operation takes `&mut self`,
/// so one instance can only ever have one operation in flight; share it
/// across tasks behind a mutex if needed.
pub struct Database<P: Pool> {
    pool: P,
    config: DatabaseConfig,
    executor: RetryingExecutor,
    lease: ConnectionLease<P::Connection>,
}

impl<P: Pool> Database<P> {
    /// Create a database handle over `pool`. No connection is leased yet.
    pub fn new(pool: P, config: DatabaseConfig) -> Self {
        Self {
            pool,
            config,
            executor: RetryingExecutor::new(),
            lease: ConnectionLease::new(),
        }
    }

    /// Lease a connection, beginning a transaction if `options` ask for one.
    ///
    /// If the transaction fails to begin, the connection stays leased and
    /// must still be closed.
    pub async fn get_connection(&mut self, options: ConnectionOptions) -> DatabaseResult<&mut Self> {
        self.lease.acquire(&self.pool, options.transaction).await?;
        Ok(self)
    }

    /// Begin a transaction on the leased connection.
    pub async fn begin_transaction(&mut self) -> DatabaseResult<()> {
        Ok(self.lease.transaction().begin().await?)
    }

    /// Execute a statement with positional bind values.
    pub async fn execute_query(&mut self, text: &str, params: &[Value]) -> DatabaseResult<ResultSet> {
        self.execute_request(QueryRequest::new(text).params(params.to_vec()))
            .await
    }

    /// Execute a statement, also retrying on `codes` for this call only.
    pub async fn execute_query_with_retry_codes<I, S>(
        &mut self,
        text: &str,
        params: &[Value],
        codes: I,
    ) -> DatabaseResult<ResultSet>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = codes
            .into_iter()
            .fold(QueryRequest::new(text).params(params.to_vec()), |req, code| {
                req.retry_on(code)
            });
        self.execute_request(request).await
    }

    /// Execute a prepared [`QueryRequest`].
    ///
    /// When the query fails for good inside a transaction, the transaction
    /// is rolled back before the query error is returned. A failure of that
    /// rollback is logged and otherwise discarded.
    pub async fn execute_request(&mut self, request: QueryRequest) -> DatabaseResult<ResultSet> {
        let conn = match self.lease.state() {
            LeaseState::Unleased => return Err(ResourceError::ConnectionNotFound.into()),
            LeaseState::Leased | LeaseState::InTransaction => self
                .lease
                .connection_mut()
                .ok_or(ResourceError::ConnectionNotFound)?,
        };

        let result = self
            .executor
            .execute(conn, &request, &self.config.retry)
            .await;
        self.lease.record_query();

        let err = match result {
            Ok(rows) => return Ok(rows),
            Err(err) => err,
        };

        match self.lease.state() {
            LeaseState::InTransaction => {
                warn!(
                    code = %err.code(),
                    attempts = err.attempts,
                    "query failed inside transaction, rolling back"
                );
                self.lease.transaction().rollback().await;
            }
            LeaseState::Leased | LeaseState::Unleased => {
                debug!(code = %err.code(), attempts = err.attempts, "query failed");
            }
        }
        Err(err.into())
    }

    /// Commit the open transaction.
    pub async fn commit(&mut self) -> DatabaseResult<()> {
        Ok(self.lease.transaction().commit().await?)
    }

    /// Roll back the open transaction, discarding any failure.
    pub async fn rollback(&mut self) {
        self.lease.transaction().rollback().await;
    }

    /// Roll back the open transaction and hand the outcome to `on_done`.
    ///
    /// With no connection or no open transaction, `on_done` receives
    /// [`TransactionError::NoConnection`].
    pub async fn rollback_with<F>(&mut self, on_done: F)
    where
        F: FnOnce(TransactionResult<()>),
    {
        self.lease.transaction().rollback_with(on_done).await;
    }

    /// Settle any open transaction per the close policy, then release the
    /// connection to the pool.
    ///
    /// Under [`ClosePolicy::AutoCommit`] a failed commit keeps the
    /// connection leased and returns the commit error; the failed commit has
    /// already rolled back, so calling `close` again releases.
    pub async fn close(&mut self) -> DatabaseResult<()> {
        match self.lease.state() {
            LeaseState::Unleased => return Err(ResourceError::ConnectionNotFound.into()),
            LeaseState::InTransaction => match self.config.close_policy {
                ClosePolicy::AutoCommit => self.lease.transaction().commit().await?,
                ClosePolicy::Rollback => self.lease.transaction().rollback().await,
            },
            LeaseState::Leased => {}
        }
        self.lease.release()?;
        Ok(())
    }

    /// Current lease state.
    pub fn state(&self) -> LeaseState {
        self.lease.state()
    }

    /// Check if a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.lease.state() == LeaseState::InTransaction
    }

    /// Snapshot of the current lease, if any.
    pub fn lease_info(&self) -> Option<LeaseInfo> {
        self.lease.info()
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the pool.
    pub fn pool(&self) -> &P {
        &self.pool
    }
}

impl<P: Pool> std::fmt::Debug for Database<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("lease", &self.lease)
            .finish()
    }
}
