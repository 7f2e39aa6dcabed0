use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::builders::NamedParam;
use crate::config::ConnectionConfig;
use crate::error::BackendError;
use crate::traits::{Connection, Connector};
use crate::types::{RawQueryResult, SqlValue};

/// A recorded statement execution for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<NamedParam>,
}

#[derive(Default)]
struct State {
    responses: VecDeque<Result<RawQueryResult, BackendError>>,
    affected: VecDeque<Result<u64, BackendError>>,
    recorded: Vec<RecordedStatement>,
    connects: Vec<ConnectionConfig>,
    connect_error: Option<BackendError>,
}

/// An in-memory connector for testing.
///
/// Every connection it opens shares one script of queued responses and one
/// log of executed statements, so a test can keep a handle to the connector
/// after giving a clone to the driver.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use dbrs::drivers::{InMemoryTestConnector, InMemoryTestResponseBuilder};
/// use dbrs::{DbRsDriver, SqlValue};
///
/// let connector = InMemoryTestConnector::new().with_response(
///     InMemoryTestResponseBuilder::new()
///         .columns(&["id", "name"])
///         .row(vec![SqlValue::Int64(1), SqlValue::from("Alice")])
///         .build(),
/// );
/// let driver = DbRsDriver::with_connector(Arc::new(connector.clone()));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryTestConnector {
    state: Arc<Mutex<State>>,
}

impl InMemoryTestConnector {
    /// Create a new in-memory test connector with no pre-configured responses.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Add a result set to be returned by the next fetch.
    /// Responses are returned in FIFO order; an empty result is returned
    /// once the queue is exhausted.
    pub fn with_response(self, response: RawQueryResult) -> Self {
        self.state().responses.push_back(Ok(response));
        self
    }

    /// Add multiple responses to be returned by subsequent fetches.
    pub fn with_responses(self, responses: impl IntoIterator<Item = RawQueryResult>) -> Self {
        self.state().responses.extend(responses.into_iter().map(Ok));
        self
    }

    /// Make the next fetch fail with `message`.
    pub fn with_fetch_error(self, message: &str) -> Self {
        self.state()
            .responses
            .push_back(Err(BackendError::new(message)));
        self
    }

    /// Set the affected-row count reported by the next execute (default 1).
    pub fn with_affected(self, rows: u64) -> Self {
        self.state().affected.push_back(Ok(rows));
        self
    }

    /// Make the next execute fail with `message`.
    pub fn with_execute_error(self, message: &str) -> Self {
        self.state()
            .affected
            .push_back(Err(BackendError::new(message)));
        self
    }

    /// Make every connect attempt fail with `message`.
    pub fn with_connect_error(self, message: &str) -> Self {
        self.state().connect_error = Some(BackendError::new(message));
        self
    }

    /// Get all recorded statements that have been executed.
    pub fn recorded_statements(&self) -> Vec<RecordedStatement> {
        self.state().recorded.clone()
    }

    /// Get the last recorded statement, if any.
    pub fn last_statement(&self) -> Option<RecordedStatement> {
        self.state().recorded.last().cloned()
    }

    /// Configs passed to successful and failed connect attempts, in order.
    pub fn connect_attempts(&self) -> Vec<ConnectionConfig> {
        self.state().connects.clone()
    }

    /// Assert that the last statement matches the expected SQL and parameters.
    pub fn assert_last_statement(&self, expected_sql: &str, expected_params: &[NamedParam]) {
        let last = self.last_statement().expect("No statements were recorded");
        assert_eq!(
            last.sql, expected_sql,
            "SQL mismatch.\nExpected: {}\nActual: {}",
            expected_sql, last.sql
        );
        assert_eq!(
            last.params, expected_params,
            "Parameters mismatch.\nExpected: {:?}\nActual: {:?}",
            expected_params, last.params
        );
    }

    /// Assert that exactly n statements were executed.
    pub fn assert_statement_count(&self, expected: usize) {
        let actual = self.state().recorded.len();
        assert_eq!(
            actual, expected,
            "Statement count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }
}

#[async_trait]
impl Connector for InMemoryTestConnector {
    fn dsn(&self, config: &ConnectionConfig) -> String {
        format!("memory:host={};dbname={}", config.host, config.database)
    }

    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, BackendError> {
        let mut state = self.state();
        state.connects.push(config.clone());
        if let Some(err) = state.connect_error.clone() {
            return Err(err);
        }
        Ok(Box::new(InMemoryTestConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Connection handed out by [`InMemoryTestConnector`].
pub struct InMemoryTestConnection {
    state: Arc<Mutex<State>>,
}

impl InMemoryTestConnection {
    fn record(&self, sql: &str, params: &[NamedParam]) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.recorded.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        state
    }
}

#[async_trait]
impl Connection for InMemoryTestConnection {
    async fn fetch(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<RawQueryResult, BackendError> {
        self.record(sql, params)
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(RawQueryResult::empty()))
    }

    async fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<u64, BackendError> {
        self.record(sql, params)
            .affected
            .pop_front()
            .unwrap_or(Ok(1))
    }
}

/// Builder for creating test responses easily.
pub struct InMemoryTestResponseBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl InMemoryTestResponseBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the column names for the response.
    pub fn columns(mut self, cols: &[&str]) -> Self {
        self.columns = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of values in column order.
    pub fn row(mut self, values: Vec<SqlValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// Build the RawQueryResult.
    pub fn build(self) -> RawQueryResult {
        RawQueryResult::new(self.columns, self.rows)
    }
}

impl Default for InMemoryTestResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
