use super::*;
use crate::error::OrmError;
use crate::mock::MockProvider;
use crate::row::Row;
use crate::session::{Session, SessionProvider};
use crate::value::BindParams;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_query_type_detection() {
    assert_eq!(QueryType::from_sql("SELECT * FROM pedidos"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  select * FROM pedidos"), QueryType::Select);
    assert_eq!(
        QueryType::from_sql("WITH t AS (SELECT 1 FROM DUAL) SELECT * FROM t"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("-- page\n(SELECT 1 FROM DUAL)"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("/* hint */ INSERT INTO pedidos (id) VALUES (:id)"),
        QueryType::Insert
    );
    assert_eq!(
        QueryType::from_sql("UPDATE pedidos SET estado = :estado"),
        QueryType::Update
    );
    assert_eq!(
        QueryType::from_sql("DELETE FROM pedidos WHERE id = :id"),
        QueryType::Delete
    );
    assert_eq!(
        QueryType::from_sql("BEGIN pkg.run(:p_id); END;"),
        QueryType::Plsql
    );
    assert_eq!(QueryType::from_sql("DECLARE x NUMBER; BEGIN NULL; END;"), QueryType::Plsql);
    assert_eq!(QueryType::from_sql("MERGE INTO t USING s ON (1=1)"), QueryType::Other);
    assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
    assert_eq!(QueryType::from_sql("-- only a comment"), QueryType::Other);
}

#[test]
fn test_error_result_truncated() {
    let long = "x".repeat(600);
    match QueryResult::error(long) {
        QueryResult::Error(msg) => {
            assert_eq!(msg.len(), 515);
            assert!(msg.ends_with("..."));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_truncate_respects_char_boundary() {
    assert_eq!(truncate_sql_bytes("ÁÉ", 3), "Á");
    assert_eq!(truncate_sql_bytes("abc", 10), "abc");
}

#[test]
fn test_logging_monitor_truncation() {
    let monitor = LoggingMonitor::new().max_sql_length(10);
    assert_eq!(monitor.truncate_sql("SELECT * FROM pedidos"), "SELECT * F...");
    assert_eq!(monitor.truncate_sql("SELECT 1"), "SELECT 1");
}

#[test]
fn test_logging_monitor_line() {
    let monitor = LoggingMonitor::new().prefix("[app]");
    let ctx = QueryContext::new("SELECT 1 FROM DUAL", 0).with_tag("pedidos.list");
    let line = monitor.format_line(&ctx, Duration::from_millis(3), &QueryResult::Rows(1));
    assert!(line.starts_with("[app] [Select] [pedidos.list] 3ms | 1 rows |"));
}

#[test]
fn test_stats_monitor() {
    let monitor = StatsMonitor::new();
    let select = QueryContext::new("SELECT * FROM pedidos", 0);
    let call = QueryContext::new("BEGIN p(:a); END;", 1);

    monitor.on_query_complete(&select, Duration::from_millis(10), &QueryResult::Rows(5));
    monitor.on_query_complete(&select, Duration::from_millis(20), &QueryResult::Rows(3));
    monitor.on_query_complete(
        &call,
        Duration::from_millis(5),
        &QueryResult::error("ORA-06550".into()),
    );

    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 3);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.plsql_count, 1);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.total_duration, Duration::from_millis(35));
    assert_eq!(stats.max_duration, Duration::from_millis(20));
    assert_eq!(stats.slowest_query.as_deref(), Some("SELECT * FROM pedidos"));

    monitor.reset();
    assert_eq!(monitor.stats(), QueryStats::default());
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl QueryMonitor for Recorder {
    fn on_query_start(&self, ctx: &QueryContext) {
        self.events.lock().unwrap().push(format!("start {}", ctx.sql));
    }

    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, result: &QueryResult) {
        self.events.lock().unwrap().push(format!("done {result}"));
    }

    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {
        self.events.lock().unwrap().push("slow".into());
    }
}

#[test]
fn test_composite_monitor_fans_out() {
    let a = Arc::new(Recorder::default());
    let b = Arc::new(Recorder::default());
    let composite = CompositeMonitor::new().add_arc(a.clone()).add_arc(b.clone());
    assert_eq!(composite.len(), 2);

    let ctx = QueryContext::new("SELECT 1 FROM DUAL", 0);
    composite.on_query_start(&ctx);
    composite.on_query_complete(&ctx, Duration::ZERO, &QueryResult::Rows(1));
    assert_eq!(a.events.lock().unwrap().len(), 2);
    assert_eq!(b.events.lock().unwrap().len(), 2);
}

#[test]
fn test_instrumented_disabled_by_default() {
    let recorder = Arc::new(Recorder::default());
    let provider = MockProvider::new();
    let mut session =
        InstrumentedSession::new(provider.session().unwrap()).with_monitor_arc(recorder.clone());
    assert!(!session.is_monitoring_enabled());

    session.query("SELECT 1 FROM DUAL", &BindParams::new()).unwrap();
    assert!(recorder.events.lock().unwrap().is_empty());
    assert_eq!(provider.statements().len(), 1);
}

#[test]
fn test_instrumented_reports_rows_affected_and_errors() {
    let recorder = Arc::new(Recorder::default());
    let provider = MockProvider::new();
    provider.push_rows(vec![Row::new().with("ID", 1), Row::new().with("ID", 2)]);
    provider.push_affected(3);
    provider.push_execute_error("ORA-00001: unique constraint violated");

    let mut session = InstrumentedSession::new(provider.session().unwrap())
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(recorder.clone());

    session.query("SELECT id FROM t", &BindParams::new()).unwrap();
    session
        .execute("UPDATE t SET x = :x", &BindParams::new().with("x", 1))
        .unwrap();
    let err = session
        .execute("INSERT INTO t (id) VALUES (:id)", &BindParams::new().with("id", 1))
        .unwrap_err();
    assert!(matches!(err, OrmError::Database(_)));

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "start SELECT id FROM t",
            "done 2 rows",
            "start UPDATE t SET x = :x",
            "done 3 affected",
            "start INSERT INTO t (id) VALUES (:id)",
            "done error: Database error: ORA-00001: unique constraint violated",
        ]
    );
}

#[test]
fn test_instrumented_slow_query() {
    let recorder = Arc::new(Recorder::default());
    let provider = MockProvider::new();
    provider.set_latency(Duration::from_millis(5));
    let mut session = InstrumentedSession::new(provider.session().unwrap())
        .with_config(
            MonitorConfig::new()
                .enable_monitoring()
                .with_slow_query_threshold(Duration::from_millis(1)),
        )
        .with_monitor_arc(recorder.clone());

    session.execute("DELETE FROM t", &BindParams::new()).unwrap();
    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("start DELETE FROM t"));
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], "slow");
}

#[test]
fn test_instrumented_forwards_transaction_control() {
    let provider = MockProvider::new();
    let mut session = InstrumentedSession::new(provider.session().unwrap()).with_tag("x");
    session.commit().unwrap();
    session.rollback().unwrap();
    session.close().unwrap();
    assert_eq!(provider.commits(), 1);
    assert_eq!(provider.rollbacks(), 1);
    assert_eq!(provider.closes(), 1);
}

#[test]
fn test_tracing_monitor_builders() {
    let monitor = TracingMonitor::new()
        .level(tracing::Level::INFO)
        .max_sql_length(20);
    assert_eq!(monitor.level, tracing::Level::INFO);
    assert_eq!(monitor.max_sql_length, Some(20));
    assert_eq!(monitor.no_truncate().max_sql_length, None);
}
