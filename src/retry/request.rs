//! A single query submitted to the executor.

use std::collections::BTreeSet;

use serde_json::Value;

/// Statement text, bind values and per-call retry codes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Statement text, passed to the driver verbatim.
    pub text: String,
    /// Positional bind values.
    pub params: Vec<Value>,
    /// Codes retried for this request in addition to the policy's.
    pub extra_retry_codes: BTreeSet<String>,
}

impl QueryRequest {
    /// Create a request with no parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            extra_retry_codes: BTreeSet::new(),
        }
    }

    /// Set the bind values.
    pub fn params(mut self, params: impl Into<Vec<Value>>) -> Self {
        self.params = params.into();
        self
    }

    /// Append one bind value.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Retry `code` for this request only.
    pub fn retry_on(mut self, code: impl Into<String>) -> Self {
        self.extra_retry_codes.insert(code.into());
        self
    }
}
