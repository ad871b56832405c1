use super::config::MonitorConfig;
use super::monitors::NoopMonitor;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use crate::error::OrmResult;
use crate::row::Row;
use crate::session::Session;
use crate::value::BindParams;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A session wrapper that times every statement and reports it to a monitor.
///
/// Monitoring must be explicitly enabled via `MonitorConfig::enable_monitoring()`;
/// while disabled the wrapper only forwards calls. Transaction control is
/// forwarded unobserved.
pub struct InstrumentedSession<S> {
    session: S,
    monitor: Arc<dyn QueryMonitor>,
    config: MonitorConfig,
    tag: Option<String>,
}

impl<S: Session> InstrumentedSession<S> {
    /// Wrap a session with no monitoring.
    pub fn new(session: S) -> Self {
        Self {
            session,
            monitor: Arc::new(NoopMonitor),
            config: MonitorConfig::default(),
            tag: None,
        }
    }

    /// Set the monitor configuration.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the query monitor.
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Set the query monitor from an Arc.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Tag every reported statement (model name, operation).
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Check if monitoring is enabled.
    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    /// Get a reference to the inner session.
    pub fn inner(&self) -> &S {
        &self.session
    }

    /// Get the inner session, consuming this wrapper.
    pub fn into_inner(self) -> S {
        self.session
    }

    fn context(&self, sql: &str, params: &BindParams) -> QueryContext {
        let ctx = QueryContext::new(sql, params.len());
        match &self.tag {
            Some(tag) => ctx.with_tag(tag.clone()),
            None => ctx,
        }
    }

    fn report(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.monitor.on_query_complete(ctx, duration, result);
        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }

    fn observe<T>(
        &mut self,
        sql: &str,
        params: &BindParams,
        run: impl FnOnce(&mut S) -> OrmResult<T>,
        outcome: impl FnOnce(&T) -> QueryResult,
    ) -> OrmResult<T> {
        if !self.config.monitoring_enabled {
            return run(&mut self.session);
        }

        let ctx = self.context(sql, params);
        self.monitor.on_query_start(&ctx);
        let start = Instant::now();
        let result = run(&mut self.session);
        let duration = start.elapsed();

        let reported = match &result {
            Ok(value) => outcome(value),
            Err(err) => QueryResult::error(err.to_string()),
        };
        self.report(&ctx, duration, &reported);
        result
    }
}

impl<S: Session> Session for InstrumentedSession<S> {
    fn execute(&mut self, sql: &str, params: &BindParams) -> OrmResult<u64> {
        self.observe(
            sql,
            params,
            |s| s.execute(sql, params),
            |n| QueryResult::Affected(*n),
        )
    }

    fn query(&mut self, sql: &str, params: &BindParams) -> OrmResult<Vec<Row>> {
        self.observe(
            sql,
            params,
            |s| s.query(sql, params),
            |rows| QueryResult::Rows(rows.len()),
        )
    }

    fn query_opt(&mut self, sql: &str, params: &BindParams) -> OrmResult<Option<Row>> {
        self.observe(
            sql,
            params,
            |s| s.query_opt(sql, params),
            |row| QueryResult::Rows(usize::from(row.is_some())),
        )
    }

    fn commit(&mut self) -> OrmResult<()> {
        self.session.commit()
    }

    fn rollback(&mut self) -> OrmResult<()> {
        self.session.rollback()
    }

    fn close(&mut self) -> OrmResult<()> {
        self.session.close()
    }
}
