//! In-memory pool and connection with scripted responses.
//!
//! Every call made against a [`MemoryConnection`] is appended to a journal on
//! the owning [`MemoryPool`], so callers can assert exactly how many begins,
//! queries, commits, rollbacks and releases were issued. Query results and
//! failures are scripted per statement text and consumed in FIFO order;
//! statements without a script succeed with an empty result set.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{Connection, DriverError, DriverResult, Pool, PoolError};
use crate::executor::{ResultSet, Row};

/// A call observed by the in-memory driver.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Acquire { connection: u64 },
    Begin { connection: u64 },
    Query { connection: u64, text: String, params: Vec<Value> },
    Commit { connection: u64 },
    Rollback { connection: u64 },
    Release { connection: u64 },
    Discard { connection: u64 },
}

/// Transaction-control operations whose next outcome can be scripted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Begin,
    Commit,
    Rollback,
}

struct MemoryPoolInner {
    max_connections: usize,
    available: Mutex<VecDeque<u64>>,
    created: Mutex<u64>,
    acquire_failures: Mutex<VecDeque<PoolError>>,
    responses: Mutex<HashMap<String, VecDeque<DriverResult<ResultSet>>>>,
    failures: Mutex<HashMap<Operation, VecDeque<DriverError>>>,
    journal: Mutex<Vec<DriverCall>>,
}

impl MemoryPoolInner {
    fn record(&self, call: DriverCall) {
        self.journal.lock().push(call);
    }

    fn take_failure(&self, op: Operation) -> DriverResult<()> {
        match self.failures.lock().get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A bounded in-memory connection pool.
#[derive(Clone)]
pub struct MemoryPool {
    inner: Arc<MemoryPoolInner>,
}

impl MemoryPool {
    /// Create a pool that hands out at most `max_connections` at once.
    pub fn new(max_connections: usize) -> Self {
        Self {
            inner: Arc::new(MemoryPoolInner {
                max_connections,
                available: Mutex::new(VecDeque::new()),
                created: Mutex::new(0),
                acquire_failures: Mutex::new(VecDeque::new()),
                responses: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashMap::new()),
                journal: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue an outcome for the next execution of `text`.
    pub fn push_response(&self, text: impl Into<String>, response: DriverResult<ResultSet>) {
        self.inner
            .responses
            .lock()
            .entry(text.into())
            .or_default()
            .push_back(response);
    }

    /// Queue a successful result for the next execution of `text`.
    pub fn push_rows(&self, text: impl Into<String>, rows: Vec<Row>) {
        self.push_response(text, Ok(ResultSet::from_rows(rows)));
    }

    /// Queue a failure for the next execution of `text`.
    pub fn push_error(&self, text: impl Into<String>, error: DriverError) {
        self.push_response(text, Err(error));
    }

    /// Make the next `op` on any connection fail with `error`.
    pub fn fail_next(&self, op: Operation, error: DriverError) {
        self.inner
            .failures
            .lock()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Make the next acquisition fail with `error`.
    pub fn fail_next_acquire(&self, error: PoolError) {
        self.inner.acquire_failures.lock().push_back(error);
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.inner.journal.lock().clone()
    }

    /// Number of times `text` was sent to the driver.
    pub fn query_count(&self, text: &str) -> usize {
        self.count(|call| matches!(call, DriverCall::Query { text: t, .. } if t == text))
    }

    /// Number of driver-level begins.
    pub fn begins(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Begin { .. }))
    }

    /// Number of driver-level commits.
    pub fn commits(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Commit { .. }))
    }

    /// Number of driver-level rollbacks.
    pub fn rollbacks(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Rollback { .. }))
    }

    /// Number of connections released back to the pool.
    pub fn releases(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Release { .. }))
    }

    /// Number of connections closed instead of returned to the pool.
    pub fn discards(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Discard { .. }))
    }

    /// Number of idle connections waiting in the pool.
    pub fn available(&self) -> usize {
        self.inner.available.lock().len()
    }

    /// Total number of connections ever created.
    pub fn created(&self) -> u64 {
        *self.inner.created.lock()
    }

    fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.inner.journal.lock().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl Pool for MemoryPool {
    type Connection = MemoryConnection;

    async fn acquire_connection(&self) -> Result<MemoryConnection, PoolError> {
        if let Some(err) = self.inner.acquire_failures.lock().pop_front() {
            return Err(err);
        }

        // Reuse an idle connection first.
        let reused = self.inner.available.lock().pop_front();
        let id = match reused {
            Some(id) => id,
            None => {
                let mut created = self.inner.created.lock();
                if *created as usize >= self.inner.max_connections {
                    return Err(PoolError::Exhausted {
                        max_connections: self.inner.max_connections,
                    });
                }
                *created += 1;
                *created
            }
        };

        self.inner.record(DriverCall::Acquire { connection: id });
        Ok(MemoryConnection {
            id,
            pool: self.inner.clone(),
            discarded: false,
        })
    }
}

/// A connection leased from a [`MemoryPool`].
///
/// Dropping the connection returns it to the pool; [`Connection::release`]
/// additionally records the release in the journal. A discarded connection
/// never goes back to the pool.
pub struct MemoryConnection {
    id: u64,
    pool: Arc<MemoryPoolInner>,
    discarded: bool,
}

#[async_trait]
impl Connection for MemoryConnection {
    fn id(&self) -> u64 {
        self.id
    }

    async fn begin_transaction(&mut self) -> DriverResult<()> {
        self.pool.record(DriverCall::Begin { connection: self.id });
        self.pool.take_failure(Operation::Begin)
    }

    async fn commit(&mut self) -> DriverResult<()> {
        self.pool.record(DriverCall::Commit { connection: self.id });
        self.pool.take_failure(Operation::Commit)
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        self.pool.record(DriverCall::Rollback { connection: self.id });
        self.pool.take_failure(Operation::Rollback)
    }

    async fn query(&mut self, text: &str, params: &[Value]) -> DriverResult<ResultSet> {
        self.pool.record(DriverCall::Query {
            connection: self.id,
            text: text.to_string(),
            params: params.to_vec(),
        });
        let scripted = self
            .pool
            .responses
            .lock()
            .get_mut(text)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(ResultSet::default()))
    }

    fn release(self) {
        self.pool.record(DriverCall::Release { connection: self.id });
    }

    fn discard(mut self) {
        self.pool.record(DriverCall::Discard { connection: self.id });
        self.discarded = true;
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if !self.discarded {
            self.pool.available.lock().push_back(self.id);
        }
    }
}
