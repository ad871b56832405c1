//! Data-access managers: a model plus its statements, run in units of work.
//!
//! A [`Manager`] binds a [`Model`], a [`SessionProvider`] and the model's
//! [`Statements`]. Every operation takes an optional caller session as its
//! last argument:
//!
//! - `None`: the operation acquires its own session, commits on success, rolls
//!   back on error and always closes it.
//! - `Some(&mut session)`: statements run on the caller's session and the
//!   caller decides when to commit. Use this to compose several operations into
//!   one transaction.
//!
//! # Example
//!
//! ```
//! use oraquery::manager::{Manager, Statements};
//! use oraquery::mock::MockProvider;
//! use oraquery::model::{Column, ColumnType, Model};
//! use oraquery::qb::{FilterRule, ValueRow};
//! use oraquery::Row;
//!
//! let model = Model::new(
//!     "pedidos",
//!     vec![
//!         Column::new("id_pedido", ColumnType::number()).primary_key(),
//!         Column::new("estado", ColumnType::varchar(20)),
//!     ],
//! )?;
//! let provider = MockProvider::new();
//! provider.push_rows(vec![Row::new().with("ID_PEDIDO", 7).with("ESTADO", "ACTIVO")]);
//!
//! let manager = Manager::new(
//!     provider.clone(),
//!     model,
//!     Statements::new("SELECT id_pedido, estado FROM pedidos"),
//! );
//! let filters = [FilterRule::new("estado")];
//! let values = [ValueRow::new().with("estado", "ACTIVO")];
//!
//! let records = manager.list(&filters, &values, None)?;
//! assert_eq!(records[0].try_get::<i64>("id_pedido")?, 7);
//! assert!(provider.last_sql().unwrap().ends_with("AND estado = :estado"));
//! # Ok::<(), oraquery::OrmError>(())
//! ```

mod dynamic;
mod hooks;
mod page;

pub use dynamic::DynamicManager;
pub use hooks::{DmlKind, Hook, ManagerHooks};
pub use page::{PageRange, PageResult, Timings};

use crate::config::ManagerConfig;
use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, validate_unquoted};
use crate::model::{Model, Record};
use crate::monitor::{InstrumentedSession, NoopMonitor, QueryMonitor};
use crate::qb::{BuiltQuery, FilterRule, QueryBuilder, ValueRow};
use crate::rewrite::{counter_wrap, range_wrap, where_wrap};
use crate::row::Row;
use crate::session::{Session, SessionProvider, scope};
use crate::value::{BindParams, IntoBindParams, Value};
use page::into_chunks;
use std::sync::Arc;
use std::time::Instant;


/// Column read from the counter-wrapped statement.
const COUNTER_COLUMN: &str = "counter";

/// Column alias of `call_function`'s result.
const RESULT_COLUMN: &str = "result";

/// SQL statements of a model.
///
/// The select is required. DML statements are optional; a manager without one
/// rejects the corresponding operation with a validation error. DML statements
/// receive the record's full column mapping as named binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    select: String,
    insert: Option<String>,
    update: Option<String>,
    delete: Option<String>,
}

impl Statements {
    /// Statements with only a select (read-only manager).
    pub fn new(select: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            insert: None,
            update: None,
            delete: None,
        }
    }

    /// Set the `INSERT` statement.
    pub fn with_insert(mut self, sql: impl Into<String>) -> Self {
        self.insert = Some(sql.into());
        self
    }

    /// Set the `UPDATE` statement.
    pub fn with_update(mut self, sql: impl Into<String>) -> Self {
        self.update = Some(sql.into());
        self
    }

    /// Set the `DELETE` statement.
    pub fn with_delete(mut self, sql: impl Into<String>) -> Self {
        self.delete = Some(sql.into());
        self
    }

    /// The base select.
    pub fn select(&self) -> &str {
        &self.select
    }

    /// The DML statement for `kind`, if configured.
    pub fn dml(&self, kind: DmlKind) -> Option<&str> {
        match kind {
            DmlKind::Insert => self.insert.as_deref(),
            DmlKind::Update => self.update.as_deref(),
            DmlKind::Delete => self.delete.as_deref(),
        }
    }

    /// Whether no DML statement is configured.
    pub fn is_read_only(&self) -> bool {
        self.insert.is_none() && self.update.is_none() && self.delete.is_none()
    }
}

/// Model-bound data access over a session provider.
pub struct Manager<P> {
    provider: P,
    model: Model,
    statements: Statements,
    config: ManagerConfig,
    hooks: ManagerHooks,
    monitor: Arc<dyn QueryMonitor>,
}

impl<P: SessionProvider> Manager<P> {
    /// Create a manager with default configuration and no hooks.
    pub fn new(provider: P, model: Model, statements: Statements) -> Self {
        Self {
            provider,
            model,
            statements,
            config: ManagerConfig::default(),
            hooks: ManagerHooks::default(),
            monitor: Arc::new(NoopMonitor),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the DML hooks.
    pub fn with_hooks(mut self, hooks: ManagerHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Report statements to `monitor` (see [`crate::monitor::MonitorConfig`]).
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Report statements to a shared monitor.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run `f` in a unit of work (or on the caller's session) behind an
    /// [`InstrumentedSession`] tagged `model.operation`.
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
                .with_tag(format!("{}.{operation}", self.model.name()));
            f(&mut s)
        })
    }

    /// The where-wrapped select with filters applied.
    fn build_select(&self, filters: &[FilterRule], values: &[ValueRow]) -> OrmResult<BuiltQuery> {
        let base = where_wrap(&self.statements.select);
        let built = QueryBuilder::new(&base, filters, values).build()?;
        tracing::trace!(target: "oraquery.manager", model = self.model.name(), sql = built.sql(), "select");
        Ok(built)
    }

    // ==================== Listings ====================

    /// Filtered rows of the model's select, mapped to records.
    pub fn list(
        &self,
        filters: &[FilterRule],
        values: &[ValueRow],
        session: Option<&mut P::Session>,
    ) -> OrmResult<Vec<Record>> {
        let (sql, params) = self.build_select(filters, values)?.into_parts();
        let rows = self.run("list", session, |s| s.query(&sql, &params))?;
        self.model.from_rows(&rows)
    }

    /// [`Manager::list`] plus the total row count and phase timings.
    pub fn list_with_count(
        &self,
        filters: &[FilterRule],
        values: &[ValueRow],
        session: Option<&mut P::Session>,
    ) -> OrmResult<PageResult<Vec<Record>>> {
        let started = Instant::now();
        let (sql, params) = self.build_select(filters, values)?.into_parts();
        self.counted("list_with_count", &sql, &counter_wrap(&sql), &params, session, started, self.config.rows_page)
    }

    /// [`Manager::list_with_count`] with records split into pages of
    /// `page_size` (default `rows_page`); the last page may be shorter.
    pub fn list_paginated(
        &self,
        filters: &[FilterRule],
        values: &[ValueRow],
        page_size: Option<usize>,
        session: Option<&mut P::Session>,
    ) -> OrmResult<PageResult<Vec<Vec<Record>>>> {
        let started = Instant::now();
        let size = page_size.unwrap_or(self.config.rows_page);
        if size == 0 {
            return Err(OrmError::validation("page size must be greater than zero"));
        }
        let (sql, params) = self.build_select(filters, values)?.into_parts();
        let counted = self.counted("list_paginated", &sql, &counter_wrap(&sql), &params, session, started, size)?;

        let page_started = Instant::now();
        let mut paged = counted.map(|records| into_chunks(records, size));
        paged.timings.page = Some(page_started.elapsed());
        paged.timings.total = started.elapsed();
        Ok(paged)
    }

    /// One page of the listing, fetched with `OFFSET .. FETCH NEXT`.
    ///
    /// `range` defaults to the first `rows_page` rows. The count is taken over
    /// the paginated statement, so it never exceeds the page's limit.
    pub fn list_page(
        &self,
        filters: &[FilterRule],
        values: &[ValueRow],
        range: Option<PageRange>,
        session: Option<&mut P::Session>,
    ) -> OrmResult<PageResult<Vec<Record>>> {
        let range = range.unwrap_or_else(|| PageRange::new(0, self.config.rows_page as i64));
        self.ranged("list_page", filters, values, range, session)
    }

    /// [`Manager::list_page`] over an explicit `(offset, limit)` pair.
    ///
    /// A missing pair is a validation error.
    pub fn list_range(
        &self,
        filters: &[FilterRule],
        values: &[ValueRow],
        range: Option<(i64, i64)>,
        session: Option<&mut P::Session>,
    ) -> OrmResult<PageResult<Vec<Record>>> {
        let Some(range) = range else {
            return Err(OrmError::validation("list_range requires an (offset, limit) pair"));
        };
        self.ranged("list_range", filters, values, range.into(), session)
    }

    fn ranged(
        &self,
        operation: &str,
        filters: &[FilterRule],
        values: &[ValueRow],
        range: PageRange,
        session: Option<&mut P::Session>,
    ) -> OrmResult<PageResult<Vec<Record>>> {
        let started = Instant::now();
        let (sql, params) = self.build_select(filters, values)?.into_parts();
        let paged = range_wrap(&sql, range.offset, range.limit)?;
        let page_size = usize::try_from(range.limit).unwrap_or(0);
        self.counted(operation, &paged, &counter_wrap(&paged), &params, session, started, page_size)
    }

    /// Count with `count_sql`, then fetch and map `sql`, in one unit of work.
    #[allow(clippy::too_many_arguments)]
    fn counted(
        &self,
        operation: &str,
        sql: &str,
        count_sql: &str,
        params: &BindParams,
        session: Option<&mut P::Session>,
        started: Instant,
        page_size: usize,
    ) -> OrmResult<PageResult<Vec<Record>>> {
        let mut timings = Timings::default();
        let (count, rows) = self.run(operation, session, |s| {
            let count_started = Instant::now();
            let count = match s.query_opt(count_sql, params)? {
                Some(row) => row.try_get::<Option<u64>>(COUNTER_COLUMN)?.unwrap_or(0),
                None => 0,
            };
            timings.count = count_started.elapsed();

            let fetch_started = Instant::now();
            let rows = s.query(sql, params)?;
            timings.fetch = fetch_started.elapsed();
            Ok((count, rows))
        })?;

        let map_started = Instant::now();
        let records = self.model.from_rows(&rows)?;
        timings.fetch += map_started.elapsed();
        timings.total = started.elapsed();

        Ok(PageResult::new(records, rows, count, timings, page_size, self.config.row_page_tab))
    }

    // ==================== DML ====================

    /// Execute the insert statement with the record's mapping.
    ///
    /// Runs `before_insert`, the statement, then `after_insert`, all in the same
    /// unit of work, and returns the record as transformed by the hooks.
    pub fn insert(&self, record: Record, session: Option<&mut P::Session>) -> OrmResult<Record> {
        self.write(DmlKind::Insert, record, session)
    }

    /// Execute the update statement with the record's mapping.
    pub fn update(&self, record: Record, session: Option<&mut P::Session>) -> OrmResult<Record> {
        self.write(DmlKind::Update, record, session)
    }

    /// Execute the delete statement with the record's mapping.
    pub fn delete(&self, record: Record, session: Option<&mut P::Session>) -> OrmResult<Record> {
        self.write(DmlKind::Delete, record, session)
    }

    fn write(
        &self,
        kind: DmlKind,
        record: Record,
        session: Option<&mut P::Session>,
    ) -> OrmResult<Record> {
        let Some(sql) = self.statements.dml(kind) else {
            return Err(OrmError::validation(format!(
                "model '{}' has no {kind} statement",
                self.model.name()
            )));
        };
        if record.model() != &self.model {
            return Err(OrmError::validation(format!(
                "record of model '{}' passed to manager of '{}'",
                record.model().name(),
                self.model.name()
            )));
        }

        self.run(kind.name(), session, |s| {
            let record = self.hooks.before(kind, record, s)?;
            let params = record.to_mapping();
            let affected = s.execute(sql, &params)?;
            tracing::debug!(target: "oraquery.manager", model = self.model.name(), operation = kind.name(), affected, "dml");
            self.hooks.after(kind, record, s)
        })
    }

    // ==================== Routines ====================

    /// Run `BEGIN name(:p1, :p2, ...); END;` with `params` bound by name.
    ///
    /// `params` is a [`BindParams`] or a flat JSON object; nested JSON values are
    /// a type error.
    pub fn call_procedure(
        &self,
        name: &str,
        params: impl IntoBindParams,
        session: Option<&mut P::Session>,
    ) -> OrmResult<()> {
        let (routine, params) = routine_call(name, params)?;
        let sql = format!("BEGIN {routine}({}); END;", params.placeholders());
        self.run("call_procedure", session, |s| s.execute(&sql, &params))?;
        Ok(())
    }

    /// Run `SELECT name(:p1, ...) AS result FROM DUAL` and return `result`.
    ///
    /// `None` when the statement returns no row.
    pub fn call_function(
        &self,
        name: &str,
        params: impl IntoBindParams,
        session: Option<&mut P::Session>,
    ) -> OrmResult<Option<Value>> {
        let (routine, params) = routine_call(name, params)?;
        let sql = format!(
            "SELECT {routine}({}) AS {RESULT_COLUMN} FROM DUAL",
            params.placeholders()
        );
        let row = self.run("call_function", session, |s| s.query_opt(&sql, &params))?;
        Ok(row.and_then(|row| row.get(RESULT_COLUMN).cloned()))
    }

    // ==================== Raw statements ====================

    /// Run a query and return every row.
    pub fn fetch_all(
        &self,
        sql: &str,
        params: &BindParams,
        session: Option<&mut P::Session>,
    ) -> OrmResult<Vec<Row>> {
        self.run("fetch_all", session, |s| s.query(sql, params))
    }

    /// Run a query and return its first row, if any.
    pub fn fetch_one(
        &self,
        sql: &str,
        params: &BindParams,
        session: Option<&mut P::Session>,
    ) -> OrmResult<Option<Row>> {
        self.run("fetch_one", session, |s| s.query_opt(sql, params))
    }

    /// Run a statement and return the number of affected rows.
    pub fn execute(
        &self,
        sql: &str,
        params: &BindParams,
        session: Option<&mut P::Session>,
    ) -> OrmResult<u64> {
        self.run("execute", session, |s| s.execute(sql, params))
    }
}

/// Validated routine name and bind map for a procedure or function call.
fn routine_call(name: &str, params: impl IntoBindParams) -> OrmResult<(String, BindParams)> {
    let routine = Ident::parse(name)?.to_sql();
    let params = params.into_bind_params()?;
    for bind in params.names() {
        validate_unquoted(bind)?;
    }
    Ok((routine, params))
}

impl<P> std::fmt::Debug for Manager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("model", &self.model.name())
            .field("statements", &self.statements)
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
