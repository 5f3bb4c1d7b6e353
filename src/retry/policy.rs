//! Retry policy keyed on driver error codes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Which driver errors are retried, and how often.
///
/// A failing statement is re-issued while its error code is retryable and
/// the number of retries already made is `<= max_retry_count`. A statement
/// that keeps failing is therefore sent `max_retry_count + 2` times before
/// the error surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retries allowed beyond the first attempt (see type docs for the bound).
    pub max_retry_count: u32,
    /// Driver error codes that trigger a retry for every query.
    pub retry_error_codes: BTreeSet<String>,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum retry count.
    pub fn max_retry_count(mut self, value: u32) -> Self {
        self.max_retry_count = value;
        self
    }

    /// Add a globally retryable error code.
    pub fn retry_error_code(mut self, code: impl Into<String>) -> Self {
        self.retry_error_codes.insert(code.into());
        self
    }

    /// Add several globally retryable error codes.
    pub fn retry_error_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retry_error_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Check whether `code` is retryable globally or via `extra`.
    pub fn is_retryable(&self, code: &str, extra: &BTreeSet<String>) -> bool {
        self.retry_error_codes.contains(code) || extra.contains(code)
    }

    /// Decide whether a failure with `code` gets another attempt, given the
    /// number of retries already made.
    pub fn should_retry(&self, retries: u32, code: &str, extra: &BTreeSet<String>) -> bool {
        self.is_retryable(code, extra) && retries <= self.max_retry_count
    }

    /// Retry count after granting another attempt, or `None` when the
    /// failure is final. Stops at `u32::MAX` instead of wrapping.
    pub fn next_retry(&self, retries: u32, code: &str, extra: &BTreeSet<String>) -> Option<u32> {
        if self.should_retry(retries, code, extra) {
            retries.checked_add(1)
        } else {
            None
        }
    }
}
