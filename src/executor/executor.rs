//! Retrying query executor.

use tracing::debug;

use super::error::{QueryError, QueryResult};
use super::result::ResultSet;
use crate::driver::Connection;
use crate::retry::{QueryRequest, RetryPolicy};

/// Runs queries against a leased connection, retrying on policy-matched
/// error codes.
///
/// Retries never re-acquire a connection and never undo work the driver has
/// already done; only the statement is sent again. Whether that is safe is
/// up to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryingExecutor;

impl RetryingExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Execute `request` on `conn` under `policy`.
    ///
    /// A failure is retried while its code is in
    /// `policy.retry_error_codes ∪ request.extra_retry_codes` and the retries
    /// made so far are `<= policy.max_retry_count`, so a statement that
    /// always fails is attempted `max_retry_count + 2` times.
    pub async fn execute<C>(
        &self,
        conn: &mut C,
        request: &QueryRequest,
        policy: &RetryPolicy,
    ) -> QueryResult<ResultSet>
    where
        C: Connection,
    {
        let mut retries: u32 = 0;
        loop {
            match conn.query(&request.text, &request.params).await {
                Ok(rows) => return Ok(rows),
                Err(err) => {
                    if let Some(next) =
                        policy.next_retry(retries, err.code(), &request.extra_retry_codes)
                    {
                        retries = next;
                        debug!(
                            connection_id = conn.id(),
                            attempt = retries.saturating_add(1),
                            code = %err.code(),
                            "retrying query"
                        );
                        continue;
                    }
                    return Err(QueryError {
                        source: err,
                        attempts: retries.saturating_add(1),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::driver::memory::MemoryPool;
    use crate::driver::{DriverError, Pool};
    use crate::executor::Row;

    const SQL: &str = "UPDATE accounts SET balance = balance - 1 WHERE id = ?";

    fn lock_timeout() -> DriverError {
        DriverError::new("LOCK_TIMEOUT", "lock wait timeout exceeded")
    }

    fn policy(max: u32) -> RetryPolicy {
        RetryPolicy::new()
            .max_retry_count(max)
            .retry_error_code("LOCK_TIMEOUT")
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let pool = MemoryPool::new(1);
        let mut conn = pool.acquire_connection().await.unwrap();

        let rows = RetryingExecutor::new()
            .execute(&mut conn, &QueryRequest::new(SQL).bind(1), &policy(2))
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(pool.query_count(SQL), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let pool = MemoryPool::new(1);
        let row: Row = serde_json::from_value(json!({"id": 1})).unwrap();
        pool.push_error(SQL, lock_timeout());
        pool.push_error(SQL, lock_timeout());
        pool.push_rows(SQL, vec![row.clone()]);
        let mut conn = pool.acquire_connection().await.unwrap();

        let rows = RetryingExecutor::new()
            .execute(&mut conn, &QueryRequest::new(SQL), &policy(2))
            .await
            .unwrap();

        assert_eq!(rows.rows, vec![row]);
        assert_eq!(pool.query_count(SQL), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_make_max_plus_two_attempts() {
        for max in 0..4u32 {
            let pool = MemoryPool::new(1);
            for _ in 0..(max + 2) {
                pool.push_error(SQL, lock_timeout());
            }
            let mut conn = pool.acquire_connection().await.unwrap();

            let err = RetryingExecutor::new()
                .execute(&mut conn, &QueryRequest::new(SQL), &policy(max))
                .await
                .unwrap_err();

            assert_eq!(err.code(), "LOCK_TIMEOUT");
            assert_eq!(err.attempts, max + 2);
            assert_eq!(pool.query_count(SQL), (max + 2) as usize);
        }
    }

    #[tokio::test]
    async fn test_last_attempt_error_is_surfaced() {
        let pool = MemoryPool::new(1);
        pool.push_error(SQL, DriverError::new("LOCK_TIMEOUT", "first"));
        pool.push_error(SQL, DriverError::new("LOCK_TIMEOUT", "second"));
        pool.push_error(SQL, DriverError::new("LOCK_TIMEOUT", "third"));
        let mut conn = pool.acquire_connection().await.unwrap();

        let err = RetryingExecutor::new()
            .execute(&mut conn, &QueryRequest::new(SQL), &policy(1))
            .await
            .unwrap_err();

        assert_eq!(err.source.message, "third");
    }

    #[tokio::test]
    async fn test_non_retryable_fails_after_one_attempt() {
        let pool = MemoryPool::new(1);
        pool.push_error(SQL, DriverError::new("ER_DUP_ENTRY", "duplicate"));
        let mut conn = pool.acquire_connection().await.unwrap();

        let err = RetryingExecutor::new()
            .execute(&mut conn, &QueryRequest::new(SQL), &policy(5))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "ER_DUP_ENTRY");
        assert_eq!(err.attempts, 1);
        assert_eq!(pool.query_count(SQL), 1);
    }

    #[tokio::test]
    async fn test_request_codes_extend_policy() {
        let pool = MemoryPool::new(1);
        pool.push_error(SQL, DriverError::new("ER_LOCK_DEADLOCK", "deadlock"));
        let mut conn = pool.acquire_connection().await.unwrap();

        let request = QueryRequest::new(SQL).retry_on("ER_LOCK_DEADLOCK");
        let result = RetryingExecutor::new()
            .execute(&mut conn, &request, &policy(0))
            .await;

        assert!(result.is_ok());
        assert_eq!(pool.query_count(SQL), 2);
    }
}
