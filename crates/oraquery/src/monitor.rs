//! Statement monitoring for sessions.
//!
//! This module provides:
//! - Timing of every statement run through an [`InstrumentedSession`]
//! - Monitors for stderr logging, `tracing` events and aggregate statistics
//! - Slow query detection
//!
//! # Example
//!
//! ```
//! use oraquery::mock::MockProvider;
//! use oraquery::monitor::{InstrumentedSession, MonitorConfig, StatsMonitor};
//! use oraquery::session::{Session, SessionProvider};
//! use oraquery::BindParams;
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let provider = MockProvider::new();
//! let mut session = InstrumentedSession::new(provider.session()?)
//!     .with_config(MonitorConfig::new().enable_monitoring())
//!     .with_monitor_arc(stats.clone());
//!
//! session.query("SELECT * FROM pedidos", &BindParams::new())?;
//! assert_eq!(stats.stats().select_count, 1);
//! # Ok::<(), oraquery::OrmError>(())
//! ```

mod config;
mod instrumented;
mod monitors;
mod tracing_monitor;
mod types;

#[cfg(test)]
mod tests;

pub use config::MonitorConfig;
pub use instrumented::InstrumentedSession;
pub use monitors::{CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use tracing_monitor::TracingMonitor;
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
