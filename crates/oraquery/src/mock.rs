//! In-memory session for tests.
//!
//! [`MockProvider`] hands out [`MockSession`]s that share one scripted state:
//! queued query results and affected-row counts, a log of every statement, and
//! counters for commit/rollback/close. Failures can be injected at connect,
//! commit, rollback and per statement.
//!
//! ```
//! use oraquery::mock::MockProvider;
//! use oraquery::session::{Session, SessionProvider};
//! use oraquery::{BindParams, Row};
//!
//! let provider = MockProvider::new();
//! provider.push_rows(vec![Row::new().with("ID", 1)]);
//!
//! let mut session = provider.session()?;
//! let rows = session.query("SELECT id FROM t", &BindParams::new())?;
//! assert_eq!(rows[0].try_get::<i64>("id")?, 1);
//! assert_eq!(provider.statements()[0].sql, "SELECT id FROM t");
//! # Ok::<(), oraquery::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::session::{Session, SessionProvider};
use crate::value::BindParams;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Driver-level error raised by scripted failures.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct MockDbError(pub String);

/// One statement seen by a mock session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    /// Session that ran the statement, numbered from 1 in acquisition order.
    pub session_id: usize,
    pub sql: String,
    pub params: BindParams,
}

#[derive(Debug, Default)]
struct MockState {
    query_results: VecDeque<Result<Vec<Row>, String>>,
    execute_results: VecDeque<Result<u64, String>>,
    statements: Vec<RecordedStatement>,
    sessions: usize,
    commits: usize,
    rollbacks: usize,
    closes: usize,
    connect_error: Option<String>,
    commit_error: Option<String>,
    rollback_error: Option<String>,
    latency: Option<Duration>,
}

/// Session provider backed by shared scripted state.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a provider with nothing scripted.
    ///
    /// Unscripted queries return no rows; unscripted statements affect 0 rows.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().query_results.push_back(Ok(rows));
    }

    /// Queue a failure for the next query.
    pub fn push_query_error(&self, message: impl Into<String>) {
        self.state().query_results.push_back(Err(message.into()));
    }

    /// Queue the affected-row count of the next executed statement.
    pub fn push_affected(&self, affected: u64) {
        self.state().execute_results.push_back(Ok(affected));
    }

    /// Queue a failure for the next executed statement.
    pub fn push_execute_error(&self, message: impl Into<String>) {
        self.state().execute_results.push_back(Err(message.into()));
    }

    /// Make every session acquisition fail with [`OrmError::Connection`].
    pub fn fail_connect(&self, message: impl Into<String>) {
        self.state().connect_error = Some(message.into());
    }

    /// Make every commit fail.
    pub fn fail_commit(&self, message: impl Into<String>) {
        self.state().commit_error = Some(message.into());
    }

    /// Make every rollback fail.
    pub fn fail_rollback(&self, message: impl Into<String>) {
        self.state().rollback_error = Some(message.into());
    }

    /// Sleep this long inside every query and execute.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    /// All statements run so far, in order.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state().statements.clone()
    }

    /// SQL of the most recent statement.
    pub fn last_sql(&self) -> Option<String> {
        self.state().statements.last().map(|s| s.sql.clone())
    }

    /// Number of sessions handed out.
    pub fn sessions(&self) -> usize {
        self.state().sessions
    }

    pub fn commits(&self) -> usize {
        self.state().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state().rollbacks
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }
}

impl SessionProvider for MockProvider {
    type Session = MockSession;

    fn session(&self) -> OrmResult<MockSession> {
        let mut state = self.state();
        if let Some(message) = &state.connect_error {
            return Err(OrmError::Connection(message.clone()));
        }
        state.sessions += 1;
        Ok(MockSession {
            id: state.sessions,
            state: Arc::clone(&self.state),
        })
    }
}

/// Session handed out by [`MockProvider`].
#[derive(Debug)]
pub struct MockSession {
    id: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, sql: &str, params: &BindParams) -> MutexGuard<'_, MockState> {
        let latency = {
            let mut state = self.state();
            state.statements.push(RecordedStatement {
                session_id: self.id,
                sql: sql.to_string(),
                params: params.clone(),
            });
            state.latency
        };
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
        self.state()
    }
}

impl Session for MockSession {
    fn execute(&mut self, sql: &str, params: &BindParams) -> OrmResult<u64> {
        let mut state = self.record(sql, params);
        match state.execute_results.pop_front() {
            Some(Ok(affected)) => Ok(affected),
            Some(Err(message)) => Err(OrmError::database(MockDbError(message))),
            None => Ok(0),
        }
    }

    fn query(&mut self, sql: &str, params: &BindParams) -> OrmResult<Vec<Row>> {
        let mut state = self.record(sql, params);
        match state.query_results.pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(OrmError::database(MockDbError(message))),
            None => Ok(Vec::new()),
        }
    }

    fn commit(&mut self) -> OrmResult<()> {
        let mut state = self.state();
        if let Some(message) = &state.commit_error {
            return Err(OrmError::database(MockDbError(message.clone())));
        }
        state.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> OrmResult<()> {
        let mut state = self.state();
        state.rollbacks += 1;
        match &state.rollback_error {
            Some(message) => Err(OrmError::database(MockDbError(message.clone()))),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> OrmResult<()> {
        self.state().closes += 1;
        Ok(())
    }
}
