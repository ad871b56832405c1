//! # oraquery
//!
//! Dynamic SQL composition and a session-scoped data-access layer for Oracle.
//!
//! ## Features
//!
//! - **Dynamic WHERE**: declarative filter rules plus runtime value rows become
//!   `AND` clauses with named `:binds` ([`qb`])
//! - **Rewriters**: where-wrap, `COUNT(*)` wrap and `OFFSET .. FETCH NEXT`
//!   pagination as plain string functions ([`rewrite`])
//! - **Units of work**: commit on success, rollback on error, always close;
//!   or run on a caller session to compose one transaction ([`session`])
//! - **Models**: ordered, validated column descriptors and records ([`model`])
//! - **Managers**: list, count, paginate, insert/update/delete with hooks,
//!   procedure and function calls ([`manager`], [`catalog`])
//! - **Query monitoring**: timing, slow-query detection, stats and `tracing`
//!   events for every statement ([`monitor`])
//!
//! ## Query builder
//!
//! ```
//! use oraquery::qb::{self, FilterRule, ValueRow};
//! use oraquery::rewrite::where_wrap;
//!
//! let base = where_wrap("SELECT id_cliente, nombre FROM clientes");
//! let built = qb::build(
//!     &base,
//!     &[FilterRule::new("nombre").operator("like").function("upper")],
//!     &[ValueRow::new().with("nombre", "%GÓMEZ%")],
//! )?;
//! assert!(built.sql().ends_with("AND UPPER(nombre) LIKE :nombre"));
//! # Ok::<(), oraquery::OrmError>(())
//! ```
//!
//! ## Managers
//!
//! With the `oracle` feature, `oracle::Connection` is a [`Session`] and any
//! `Fn() -> OrmResult<Connection>` closure is a provider:
//!
//! ```ignore
//! use oraquery::manager::{Manager, Statements};
//!
//! let provider = || Ok(oracle::Connection::connect("hr", "hr", "//db:1521/XEPDB1")?);
//! let pedidos = Manager::new(provider, model, Statements::new("SELECT * FROM pedidos"));
//! let page = pedidos.list_page(&filters, &values, None, None)?;
//! println!("{} of {} rows", page.result.len(), page.count);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod ident;
pub mod manager;
pub mod mock;
pub mod model;
pub mod monitor;
pub mod qb;
pub mod rewrite;
pub mod row;
pub mod session;
pub mod value;

#[cfg(feature = "oracle")]
pub mod driver;

pub use config::ManagerConfig;
pub use error::{OrmError, OrmResult};
pub use ident::Ident;
pub use manager::{
    DynamicManager, Manager, ManagerHooks, PageRange, PageResult, Statements, Timings,
};
pub use model::{Column, ColumnInfo, ColumnType, Model, Record};
pub use monitor::{
    CompositeMonitor, InstrumentedSession, LoggingMonitor, MonitorConfig, NoopMonitor,
    QueryContext, QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor, TracingMonitor,
};
pub use qb::{BuiltQuery, FilterRule, Operator, QueryBuilder, ValueRow};
pub use row::{FromRow, Row};
pub use session::{Session, SessionProvider, UnitOfWork};
pub use value::{BindParams, FromValue, IntoBindParams, Value};

#[cfg(feature = "oracle")]
pub use driver::OracleProvider;
