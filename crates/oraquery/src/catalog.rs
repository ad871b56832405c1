//! Read-only managers over Oracle data-dictionary and dynamic performance views.
//!
//! Each [`CatalogView`] pairs a dictionary query with a [`Model`] describing
//! its columns. The managers have no DML statements, so `insert`, `update`
//! and `delete` fail with a validation error. Listing, counting and
//! pagination work as for any other [`Manager`].
//!
//! Most views need `SELECT_CATALOG_ROLE` (`V$` views) or `SELECT ANY
//! DICTIONARY` (`DBA_SCHEDULER_*`).
//!
//! ```
//! use oraquery::catalog;
//! use oraquery::mock::MockProvider;
//! use oraquery::qb::{FilterRule, ValueRow};
//!
//! let provider = MockProvider::new();
//! let sequences = catalog::all_sequences(provider.clone())?;
//! sequences.list(
//!     &[FilterRule::new("sequence_owner")],
//!     &[ValueRow::new().with("sequence_owner", "HR")],
//!     None,
//! )?;
//! assert!(provider.last_sql().unwrap().contains("FROM ALL_SEQUENCES"));
//! # Ok::<(), oraquery::OrmError>(())
//! ```

use crate::error::OrmResult;
use crate::manager::{Manager, Statements};
use crate::model::{Column, ColumnType, Model};
use crate::session::SessionProvider;

/// A predefined dictionary query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogView {
    /// Sequences visible to the user (`ALL_SEQUENCES`).
    AllSequences,
    /// Columns with type, nullability, primary-key flag and comment (`ALL_TAB_COLUMNS`).
    TableStructure,
    /// Primary-key columns (`ALL_CONSTRAINTS` type `P`).
    PrimaryKeys,
    /// Foreign-key column pairs with the referenced table and column.
    TableDependencies,
    /// Blocking/waiting session pairs (`V$LOCK`).
    SessionLocks,
    /// Every session with its current SQL text (`V$SESSION` + `V$SQL`).
    ActiveSessions,
    /// Active sessions that are running a statement right now.
    CurrentQueries,
    /// Scheduler jobs with the status and error of their last run.
    SchedulerJobStatus,
    /// Scheduler jobs with their program, schedule and last run.
    SchedulerJobDetails,
}

impl CatalogView {
    /// Every view.
    pub const ALL: [CatalogView; 9] = [
        CatalogView::AllSequences,
        CatalogView::TableStructure,
        CatalogView::PrimaryKeys,
        CatalogView::TableDependencies,
        CatalogView::SessionLocks,
        CatalogView::ActiveSessions,
        CatalogView::CurrentQueries,
        CatalogView::SchedulerJobStatus,
        CatalogView::SchedulerJobDetails,
    ];

    /// Model name of the view.
    pub fn name(self) -> &'static str {
        match self {
            CatalogView::AllSequences => "all_sequences",
            CatalogView::TableStructure => "table_structure",
            CatalogView::PrimaryKeys => "all_primary_keys",
            CatalogView::TableDependencies => "all_table_dependencies",
            CatalogView::SessionLocks => "session_locks",
            CatalogView::ActiveSessions => "all_sessions_active",
            CatalogView::CurrentQueries => "current_execute_query",
            CatalogView::SchedulerJobStatus => "job_scheduler_status",
            CatalogView::SchedulerJobDetails => "job_scheduler_details",
        }
    }

    /// The base select.
    pub fn select_sql(self) -> &'static str {
        match self {
            CatalogView::AllSequences => ALL_SEQUENCES_SQL,
            CatalogView::TableStructure => TABLE_STRUCTURE_SQL,
            CatalogView::PrimaryKeys => PRIMARY_KEYS_SQL,
            CatalogView::TableDependencies => TABLE_DEPENDENCIES_SQL,
            CatalogView::SessionLocks => SESSION_LOCKS_SQL,
            CatalogView::ActiveSessions => ACTIVE_SESSIONS_SQL,
            CatalogView::CurrentQueries => CURRENT_QUERIES_SQL,
            CatalogView::SchedulerJobStatus => JOB_STATUS_SQL,
            CatalogView::SchedulerJobDetails => JOB_DETAILS_SQL,
        }
    }

    /// Column descriptors, in select order.
    pub fn columns(self) -> Vec<Column> {
        let text = ColumnType::string;
        let int = ColumnType::number;
        match self {
            CatalogView::AllSequences => vec![
                Column::new("sequence_owner", text()).primary_key(),
                Column::new("sequence_name", text()).primary_key(),
                // MAX_VALUE defaults to 28 nines, outside i64.
                Column::new("min_value", ColumnType::float()),
                Column::new("max_value", ColumnType::float()),
                Column::new("increment_by", int()),
                Column::new("cycle_flag", text()),
                Column::new("order_flag", text()),
                Column::new("cache_size", int()),
                Column::new("last_number", ColumnType::float()),
            ],
            CatalogView::TableStructure => vec![
                Column::new("owner", text()).primary_key(),
                Column::new("table_name", text()).primary_key(),
                Column::new("column_name", text()).primary_key(),
                Column::new("data_type", text()),
                Column::new("data_length", int()),
                Column::new("data_precision", int()),
                Column::new("data_scale", int()),
                Column::new("nullable", text()),
                Column::new("primary_key", text()),
                Column::new("comments", text()),
            ],
            CatalogView::PrimaryKeys => vec![
                Column::new("owner", text()).primary_key(),
                Column::new("table_name", text()).primary_key(),
                Column::new("constraint_name", text()).primary_key(),
                Column::new("column_name", text()).primary_key(),
                Column::new("position", int()),
            ],
            CatalogView::TableDependencies => vec![
                Column::new("table_name", text()).primary_key(),
                Column::new("column_name", text()).primary_key(),
                Column::new("constraint_name", text()).primary_key(),
                Column::new("referenced_table", text()),
                Column::new("referenced_column", text()),
            ],
            CatalogView::SessionLocks => vec![
                Column::new("holding_session", int()).primary_key(),
                Column::new("waiting_session", int()).primary_key(),
                Column::new("id1", int()),
                Column::new("id2", int()),
                Column::new("type", text()),
                Column::new("lmode", int()),
                Column::new("request", int()),
            ],
            CatalogView::ActiveSessions => vec![
                Column::new("sid", int()).primary_key(),
                Column::new("serial#", int()).primary_key(),
                Column::new("username", text()),
                Column::new("status", text()),
                Column::new("program", text()),
                Column::new("module", text()),
                Column::new("machine", text()),
                Column::new("logon_time", ColumnType::DateTime),
                Column::new("sql_id", text()),
                Column::new("sql_text", text()),
            ],
            CatalogView::CurrentQueries => vec![
                Column::new("sid", int()).primary_key(),
                Column::new("serial#", int()).primary_key(),
                Column::new("username", text()),
                Column::new("osuser", text()),
                Column::new("machine", text()),
                Column::new("program", text()),
                Column::new("status", text()),
                Column::new("sql_id", text()),
                Column::new("sql_text", text()),
            ],
            CatalogView::SchedulerJobStatus => vec![
                Column::new("job_name", text()).primary_key(),
                Column::new("owner", text()).primary_key(),
                Column::new("job_type", text()),
                Column::new("job_action", text()),
                Column::new("enabled", text()),
                Column::new("state", text()),
                Column::new("start_date", ColumnType::DateTime),
                Column::new("next_run_date", ColumnType::DateTime),
                Column::new("last_status", text()),
                Column::new("error#", int()),
                Column::new("additional_info", text()),
                Column::new("actual_start_date", ColumnType::DateTime),
                Column::new("run_duration", text()),
            ],
            CatalogView::SchedulerJobDetails => vec![
                Column::new("job_name", text()).primary_key(),
                Column::new("owner", text()).primary_key(),
                Column::new("state", text()),
                Column::new("enabled", text()),
                Column::new("start_date", ColumnType::DateTime),
                Column::new("next_run_date", ColumnType::DateTime),
                Column::new("repeat_interval", text()),
                Column::new("schedule_name", text()),
                Column::new("program_name", text()),
                Column::new("program_type", text()),
                Column::new("program_action", text()),
                Column::new("last_run_status", text()),
                Column::new("actual_start_date", ColumnType::DateTime),
                Column::new("run_duration", text()),
                Column::new("schedule_type", text()),
                Column::new("schedule_start", ColumnType::DateTime),
                Column::new("schedule_repeat", text()),
            ],
        }
    }

    /// The view's model.
    pub fn model(self) -> OrmResult<Model> {
        Model::new(self.name(), self.columns())
    }

    /// A read-only manager over the view.
    pub fn manager<P: SessionProvider>(self, provider: P) -> OrmResult<Manager<P>> {
        Ok(Manager::new(
            provider,
            self.model()?,
            Statements::new(self.select_sql()),
        ))
    }
}

/// [`CatalogView::AllSequences`] manager.
pub fn all_sequences<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::AllSequences.manager(provider)
}

/// [`CatalogView::TableStructure`] manager.
pub fn table_structure<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::TableStructure.manager(provider)
}

/// [`CatalogView::PrimaryKeys`] manager.
pub fn primary_keys<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::PrimaryKeys.manager(provider)
}

/// [`CatalogView::TableDependencies`] manager.
pub fn table_dependencies<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::TableDependencies.manager(provider)
}

/// [`CatalogView::SessionLocks`] manager.
pub fn session_locks<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::SessionLocks.manager(provider)
}

/// [`CatalogView::ActiveSessions`] manager.
pub fn active_sessions<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::ActiveSessions.manager(provider)
}

/// [`CatalogView::CurrentQueries`] manager.
pub fn current_queries<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::CurrentQueries.manager(provider)
}

/// [`CatalogView::SchedulerJobStatus`] manager.
pub fn scheduler_job_status<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::SchedulerJobStatus.manager(provider)
}

/// [`CatalogView::SchedulerJobDetails`] manager.
pub fn scheduler_job_details<P: SessionProvider>(provider: P) -> OrmResult<Manager<P>> {
    CatalogView::SchedulerJobDetails.manager(provider)
}

const ALL_SEQUENCES_SQL: &str = "\
SELECT SEQUENCE_OWNER, SEQUENCE_NAME, MIN_VALUE, MAX_VALUE, INCREMENT_BY,
       CYCLE_FLAG, ORDER_FLAG, CACHE_SIZE, LAST_NUMBER
FROM ALL_SEQUENCES";

const TABLE_STRUCTURE_SQL: &str = "\
SELECT C.OWNER, C.TABLE_NAME, C.COLUMN_NAME, C.DATA_TYPE, C.DATA_LENGTH,
       C.DATA_PRECISION, C.DATA_SCALE, C.NULLABLE,
       CASE WHEN PK.COLUMN_NAME IS NOT NULL THEN 'YES' ELSE 'NO' END AS PRIMARY_KEY,
       CC.COMMENTS
FROM ALL_TAB_COLUMNS C
LEFT JOIN (
    SELECT ACC.OWNER, ACC.TABLE_NAME, ACC.COLUMN_NAME
    FROM ALL_CONSTRAINTS AC
    JOIN ALL_CONS_COLUMNS ACC
      ON AC.CONSTRAINT_NAME = ACC.CONSTRAINT_NAME AND AC.OWNER = ACC.OWNER
    WHERE AC.CONSTRAINT_TYPE = 'P'
) PK ON C.OWNER = PK.OWNER AND C.TABLE_NAME = PK.TABLE_NAME AND C.COLUMN_NAME = PK.COLUMN_NAME
LEFT JOIN ALL_COL_COMMENTS CC
  ON C.OWNER = CC.OWNER AND C.TABLE_NAME = CC.TABLE_NAME AND C.COLUMN_NAME = CC.COLUMN_NAME
ORDER BY C.OWNER, C.TABLE_NAME, C.COLUMN_ID";

const PRIMARY_KEYS_SQL: &str = "\
SELECT AC.OWNER, AC.TABLE_NAME, AC.CONSTRAINT_NAME, ACC.COLUMN_NAME, ACC.POSITION
FROM ALL_CONSTRAINTS AC
JOIN ALL_CONS_COLUMNS ACC
  ON AC.CONSTRAINT_NAME = ACC.CONSTRAINT_NAME AND AC.OWNER = ACC.OWNER
WHERE AC.CONSTRAINT_TYPE = 'P'
ORDER BY AC.OWNER, AC.TABLE_NAME, ACC.POSITION";

const TABLE_DEPENDENCIES_SQL: &str = "\
SELECT A.TABLE_NAME, A.COLUMN_NAME, A.CONSTRAINT_NAME,
       C_PK.TABLE_NAME AS REFERENCED_TABLE, B.COLUMN_NAME AS REFERENCED_COLUMN
FROM ALL_CONS_COLUMNS A
JOIN ALL_CONSTRAINTS C
  ON A.CONSTRAINT_NAME = C.CONSTRAINT_NAME AND A.OWNER = C.OWNER
JOIN ALL_CONSTRAINTS C_PK
  ON C.R_CONSTRAINT_NAME = C_PK.CONSTRAINT_NAME AND C.R_OWNER = C_PK.OWNER
JOIN ALL_CONS_COLUMNS B
  ON C_PK.CONSTRAINT_NAME = B.CONSTRAINT_NAME AND C_PK.OWNER = B.OWNER AND B.POSITION = A.POSITION
WHERE C.CONSTRAINT_TYPE = 'R'";

const SESSION_LOCKS_SQL: &str = "\
SELECT L1.SID AS HOLDING_SESSION, L2.SID AS WAITING_SESSION,
       L1.ID1, L1.ID2, L1.TYPE, L1.LMODE, L2.REQUEST
FROM V$LOCK L1
JOIN V$LOCK L2 ON L1.ID1 = L2.ID1 AND L1.ID2 = L2.ID2
WHERE L1.BLOCK = 1 AND L2.REQUEST > 0";

const ACTIVE_SESSIONS_SQL: &str = "\
SELECT S.SID, S.SERIAL#, S.USERNAME, S.STATUS, S.PROGRAM, S.MODULE, S.MACHINE,
       S.LOGON_TIME, S.SQL_ID, Q.SQL_TEXT
FROM V$SESSION S
LEFT JOIN V$SQL Q ON S.SQL_ID = Q.SQL_ID AND S.SQL_CHILD_NUMBER = Q.CHILD_NUMBER";

const CURRENT_QUERIES_SQL: &str = "\
SELECT S.SID, S.SERIAL#, S.USERNAME, S.OSUSER, S.MACHINE, S.PROGRAM, S.STATUS,
       S.SQL_ID, Q.SQL_TEXT
FROM V$SESSION S
JOIN V$SQL Q ON S.SQL_ID = Q.SQL_ID AND S.SQL_CHILD_NUMBER = Q.CHILD_NUMBER
WHERE S.STATUS = 'ACTIVE'";

const JOB_STATUS_SQL: &str = "\
SELECT J.JOB_NAME, J.OWNER, J.JOB_TYPE, J.JOB_ACTION, J.ENABLED, J.STATE,
       J.START_DATE, J.NEXT_RUN_DATE, R.STATUS AS LAST_STATUS, R.ERROR#,
       R.ADDITIONAL_INFO, R.ACTUAL_START_DATE, R.RUN_DURATION
FROM DBA_SCHEDULER_JOBS J
LEFT JOIN (
    SELECT JOB_NAME, OWNER, STATUS, ERROR#, ADDITIONAL_INFO, ACTUAL_START_DATE, RUN_DURATION,
           ROW_NUMBER() OVER (PARTITION BY JOB_NAME, OWNER ORDER BY ACTUAL_START_DATE DESC) AS RN
    FROM DBA_SCHEDULER_JOB_RUN_DETAILS
) R ON J.JOB_NAME = R.JOB_NAME AND J.OWNER = R.OWNER AND R.RN = 1
ORDER BY J.NEXT_RUN_DATE";

const JOB_DETAILS_SQL: &str = "\
SELECT J.JOB_NAME, J.OWNER, J.STATE, J.ENABLED, J.START_DATE, J.NEXT_RUN_DATE,
       J.REPEAT_INTERVAL, J.SCHEDULE_NAME, J.PROGRAM_NAME, P.PROGRAM_TYPE, P.PROGRAM_ACTION,
       R.STATUS AS LAST_RUN_STATUS, R.ACTUAL_START_DATE, R.RUN_DURATION,
       S.SCHEDULE_TYPE, S.START_DATE AS SCHEDULE_START, S.REPEAT_INTERVAL AS SCHEDULE_REPEAT
FROM DBA_SCHEDULER_JOBS J
LEFT JOIN DBA_SCHEDULER_PROGRAMS P
  ON J.PROGRAM_NAME = P.PROGRAM_NAME AND J.OWNER = P.OWNER
LEFT JOIN (
    SELECT JOB_NAME, OWNER, STATUS, ACTUAL_START_DATE, RUN_DURATION,
           ROW_NUMBER() OVER (PARTITION BY JOB_NAME, OWNER ORDER BY ACTUAL_START_DATE DESC) AS RN
    FROM DBA_SCHEDULER_JOB_RUN_DETAILS
) R ON J.JOB_NAME = R.JOB_NAME AND J.OWNER = R.OWNER AND R.RN = 1
LEFT JOIN DBA_SCHEDULER_SCHEDULES S
  ON J.SCHEDULE_NAME = S.SCHEDULE_NAME AND J.OWNER = S.OWNER
ORDER BY J.NEXT_RUN_DATE";
