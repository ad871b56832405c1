//! Ad-hoc statements with optional dynamic filters.

use crate::config::ManagerConfig;
use crate::error::OrmResult;
use crate::monitor::{InstrumentedSession, NoopMonitor, QueryMonitor};
use crate::qb::{FilterRule, QueryBuilder, ValueRow};
use crate::row::Row;
use crate::session::{Session, SessionProvider, scope};
use crate::value::BindParams;
use std::sync::Arc;

/// Runs arbitrary SQL, appending filter clauses when filters and values are given.
///
/// Unlike [`Manager`](super::Manager) there is no model and no where-wrapping:
/// the base statement must already end in a predicate that `AND` clauses can
/// follow (`WHERE 1 = 1`).
///
/// ```
/// use oraquery::manager::DynamicManager;
/// use oraquery::mock::MockProvider;
/// use oraquery::qb::{FilterRule, ValueRow};
/// use oraquery::BindParams;
///
/// let provider = MockProvider::new();
/// let dm = DynamicManager::new(provider.clone());
/// dm.execute(
///     "UPDATE pedidos SET estado = :nuevo_estado WHERE 1 = 1",
///     &BindParams::new().with("nuevo_estado", "ENTREGADO"),
///     &[FilterRule::new("id_pedido")],
///     &[ValueRow::new().with("id_pedido", 12345)],
///     None,
/// )?;
/// let stmt = provider.statements().pop().unwrap();
/// assert!(stmt.sql.ends_with("AND id_pedido = :id_pedido"));
/// assert_eq!(stmt.params.len(), 2);
/// # Ok::<(), oraquery::OrmError>(())
/// ```
pub struct DynamicManager<P> {
    provider: P,
    config: ManagerConfig,
    monitor: Arc<dyn QueryMonitor>,
}

impl<P: SessionProvider> DynamicManager<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: ManagerConfig::default(),
            monitor: Arc::new(NoopMonitor),
        }
    }

    /// Replace the configuration; only its monitor settings apply here.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Final SQL and binds: builder output first, then `extra` on top.
    ///
    /// The builder only runs when both `filters` and `values` are non-empty.
    pub fn build_query(
        &self,
        base_sql: &str,
        extra: &BindParams,
        filters: &[FilterRule],
        values: &[ValueRow],
    ) -> OrmResult<(String, BindParams)> {
        let (sql, mut params) = if filters.is_empty() || values.is_empty() {
            (base_sql.to_string(), BindParams::new())
        } else {
            QueryBuilder::new(base_sql, filters, values).build()?.into_parts()
        };
        params.merge(extra);
        Ok((sql, params))
    }

    fn run<T>(
        &self,
        operation: &str,
        session: Option<&mut P::Session>,
        f: impl FnOnce(&mut dyn Session) -> OrmResult<T>,
    ) -> OrmResult<T> {
        scope(&self.provider, session, |s| {
            let mut s = InstrumentedSession::new(s)
                .with_config(self.config.monitor.clone())
                .with_monitor_arc(Arc::clone(&self.monitor))
                .with_tag(format!("dynamic.{operation}"));
            f(&mut s)
        })
    }

    /// All rows of the filtered query.
    pub fn fetch_all(
        &self,
        base_sql: &str,
        params: &BindParams,
        filters: &[FilterRule],
        values: &[ValueRow],
        session: Option<&mut P::Session>,
    ) -> OrmResult<Vec<Row>> {
        let (sql, params) = self.build_query(base_sql, params, filters, values)?;
        self.run("fetch_all", session, |s| s.query(&sql, &params))
    }

    /// First row of the filtered query, if any.
    pub fn fetch_one(
        &self,
        base_sql: &str,
        params: &BindParams,
        filters: &[FilterRule],
        values: &[ValueRow],
        session: Option<&mut P::Session>,
    ) -> OrmResult<Option<Row>> {
        let (sql, params) = self.build_query(base_sql, params, filters, values)?;
        self.run("fetch_one", session, |s| s.query_opt(&sql, &params))
    }

    /// Execute the filtered statement and return the affected row count.
    pub fn execute(
        &self,
        base_sql: &str,
        params: &BindParams,
        filters: &[FilterRule],
        values: &[ValueRow],
        session: Option<&mut P::Session>,
    ) -> OrmResult<u64> {
        let (sql, params) = self.build_query(base_sql, params, filters, values)?;
        self.run("execute", session, |s| s.execute(&sql, &params))
    }
}
