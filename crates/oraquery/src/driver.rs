//! [`Session`] implementation for `oracle::Connection` (feature `oracle`).
//!
//! Binds are passed by name. Fetched columns are converted by their Oracle
//! type: `NUMBER` becomes [`Value::Int`] when the text form is integral and
//! [`Value::Float`] otherwise, `DATE` and `TIMESTAMP` become
//! [`Value::DateTime`], `RAW`/`BLOB` become [`Value::Bytes`] and everything
//! else is read as text.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::session::{Session, SessionProvider};
use crate::value::{BindParams, Value};
use chrono::NaiveDateTime;
use oracle::sql_type::{OracleType, ToSql};
use oracle::Connection;
use serde::Deserialize;
use std::fmt;

impl Session for Connection {
    fn execute(&mut self, sql: &str, params: &BindParams) -> OrmResult<u64> {
        let values = bind_values(params);
        let binds = named_binds(params, &values);
        let stmt = self.execute_named(sql, &binds)?;
        Ok(stmt.row_count()?)
    }

    fn query(&mut self, sql: &str, params: &BindParams) -> OrmResult<Vec<Row>> {
        let values = bind_values(params);
        let binds = named_binds(params, &values);
        let result_set = self.query_named(sql, &binds)?;
        let mut rows = Vec::new();
        for row in result_set {
            rows.push(convert_row(&row?)?);
        }
        Ok(rows)
    }

    fn commit(&mut self) -> OrmResult<()> {
        Ok(Connection::commit(self)?)
    }

    fn rollback(&mut self) -> OrmResult<()> {
        Ok(Connection::rollback(self)?)
    }

    fn close(&mut self) -> OrmResult<()> {
        Ok(Connection::close(self)?)
    }
}

fn bind_values(params: &BindParams) -> Vec<Box<dyn ToSql>> {
    params.iter().map(|(_, value)| to_sql(value)).collect()
}

fn named_binds<'a>(
    params: &'a BindParams,
    values: &'a [Box<dyn ToSql>],
) -> Vec<(&'a str, &'a dyn ToSql)> {
    params
        .names()
        .zip(values.iter().map(|v| v.as_ref()))
        .collect()
}

fn to_sql(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(None::<String>),
        Value::String(s) => Box::new(s.clone()),
        Value::Int(i) => Box::new(*i),
        Value::Float(f) => Box::new(*f),
        Value::Date(d) => Box::new(*d),
        Value::DateTime(dt) => Box::new(*dt),
        Value::Bytes(b) => Box::new(b.clone()),
    }
}

fn convert_row(row: &oracle::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (idx, info) in row.column_info().iter().enumerate() {
        let value = column_value(row, idx, info.oracle_type())
            .map_err(|e| OrmError::decode(info.name(), e.to_string()))?;
        out.push(info.name(), value);
    }
    Ok(out)
}

fn column_value(row: &oracle::Row, idx: usize, ty: &OracleType) -> oracle::Result<Value> {
    let value = match ty {
        OracleType::Number(..) | OracleType::Float(_) => row
            .get::<_, Option<String>>(idx)?
            .map_or(Value::Null, |text| number_value(&text)),
        OracleType::BinaryFloat | OracleType::BinaryDouble => row.get::<_, Option<f64>>(idx)?.into(),
        OracleType::Int64 => row.get::<_, Option<i64>>(idx)?.into(),
        OracleType::Boolean => row.get::<_, Option<bool>>(idx)?.into(),
        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => row.get::<_, Option<NaiveDateTime>>(idx)?.into(),
        OracleType::Raw(_) | OracleType::BLOB | OracleType::LongRaw => {
            row.get::<_, Option<Vec<u8>>>(idx)?.into()
        }
        _ => row.get::<_, Option<String>>(idx)?.into(),
    };
    Ok(value)
}

/// `NUMBER` text to `Int` when it fits an `i64`, else `Float`.
fn number_value(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    match text.parse::<f64>() {
        Ok(f) => Value::Float(f),
        Err(_) => Value::String(text.to_string()),
    }
}

/// Connects with `oracle::Connection::connect` for every session.
///
/// Deserializable so credentials can live next to
/// [`ManagerConfig`](crate::ManagerConfig) in the application's configuration.
#[derive(Clone, Deserialize)]
pub struct OracleProvider {
    pub username: String,
    pub password: String,
    /// Easy Connect string or TNS alias (`//host:1521/service`).
    pub connect_string: String,
}

impl OracleProvider {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        connect_string: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            connect_string: connect_string.into(),
        }
    }
}

impl SessionProvider for OracleProvider {
    type Session = Connection;

    fn session(&self) -> OrmResult<Connection> {
        Connection::connect(&self.username, &self.password, &self.connect_string)
            .map_err(|e| OrmError::Connection(e.to_string()))
    }
}

impl fmt::Debug for OracleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleProvider")
            .field("username", &self.username)
            .field("password", &"***")
            .field("connect_string", &self.connect_string)
            .finish()
    }
}
