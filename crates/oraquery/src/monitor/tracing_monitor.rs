use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based monitor emitting one event per statement on target
/// `oraquery.sql`.
///
/// The SQL is emitted when the statement starts; completion emits the duration
/// and outcome. Failures are always emitted at `WARN`.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl TracingMonitor {
    /// Create a new monitor with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query_start(&self, ctx: &QueryContext) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        let sql = self.truncate_sql(&ctx.sql);
        emit_at_level!(
            self.level,
            target: "oraquery.sql",
            query_type = ?ctx.query_type,
            tag,
            param_count = ctx.param_count,
            sql = %sql,
        );
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        let elapsed_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        match result {
            QueryResult::Error(error) => tracing::warn!(
                target: "oraquery.sql",
                query_type = ?ctx.query_type,
                tag,
                elapsed_us,
                error = %error,
                "statement failed"
            ),
            ok => emit_at_level!(
                self.level,
                target: "oraquery.sql",
                query_type = ?ctx.query_type,
                tag,
                elapsed_us,
                result = %ok,
                "statement complete"
            ),
        }
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        let sql = self.truncate_sql(&ctx.sql);
        tracing::warn!(
            target: "oraquery.sql",
            query_type = ?ctx.query_type,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            sql = %sql,
            "slow query"
        );
    }
}
