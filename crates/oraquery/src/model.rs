//! Typed column descriptors and the row-to-record mapper.
//!
//! A [`Model`] is a named, ordered list of [`Column`] descriptors. A [`Record`]
//! holds one validated [`Value`] per column and converts to and from rows.
//!
//! ```
//! use oraquery::model::{Column, ColumnType, Model};
//! use oraquery::Row;
//!
//! let pedidos = Model::new(
//!     "pedidos",
//!     vec![
//!         Column::new("id", ColumnType::number()).primary_key(),
//!         Column::new("estado", ColumnType::varchar(20)).not_null().default("NUEVO"),
//!         Column::new("total", ColumnType::decimal(12, 2)),
//!     ],
//! )?;
//!
//! let record = pedidos.from_row(&Row::new().with("ID", 7).with("TOTAL", 10.005))?;
//! assert_eq!(record.try_get::<String>("estado")?, "NUEVO");
//! assert_eq!(record.try_get::<f64>("total")?, 10.01);
//! assert_eq!(record.to_string(), "pedidos: id=7");
//! # Ok::<(), oraquery::OrmError>(())
//! ```

mod validate;


use crate::error::{OrmError, OrmResult};
use crate::ident::validate_unquoted;
use crate::row::Row;
use crate::value::{BindParams, FromValue, Value};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

/// Largest `VARCHAR2` accepted, in bytes.
pub const MAX_STRING_BYTES: usize = 4000;
/// Largest `NUMBER` precision.
pub const MAX_NUMBER_PRECISION: u32 = 38;
/// Largest `RAW`, in bytes.
pub const MAX_RAW_BYTES: usize = 2000;

/// Semantic type and bounds of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// `VARCHAR2`: byte limit (capped at 4000) and minimum character count.
    String { max_bytes: usize, min_length: usize },
    /// Integral `NUMBER` with optional bounds.
    Number { min: Option<i64>, max: Option<i64> },
    /// Fractional `NUMBER(p, s)`; values are rounded half-up to `scale`.
    Float {
        precision: u32,
        scale: Option<u32>,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// `DATE`
    Date,
    /// `DATE` / `TIMESTAMP` with time of day
    DateTime,
    /// `RAW`
    Bytes { max_bytes: usize },
    /// Any value is accepted as is.
    Any,
}

impl ColumnType {
    /// `VARCHAR2(4000)`.
    pub fn string() -> Self {
        Self::varchar(MAX_STRING_BYTES)
    }

    /// `VARCHAR2(max_bytes)`.
    pub fn varchar(max_bytes: usize) -> Self {
        ColumnType::String {
            max_bytes,
            min_length: 0,
        }
    }

    /// Unbounded integer `NUMBER`.
    pub fn number() -> Self {
        ColumnType::Number {
            min: None,
            max: None,
        }
    }

    /// `NUMBER` with no scale.
    pub fn float() -> Self {
        ColumnType::Float {
            precision: MAX_NUMBER_PRECISION,
            scale: None,
            min: None,
            max: None,
        }
    }

    /// `NUMBER(precision, scale)`.
    pub fn decimal(precision: u32, scale: u32) -> Self {
        ColumnType::Float {
            precision,
            scale: Some(scale),
            min: None,
            max: None,
        }
    }

    /// `RAW(2000)`.
    pub fn bytes() -> Self {
        ColumnType::Bytes {
            max_bytes: MAX_RAW_BYTES,
        }
    }

    /// Short type name (`string`, `number`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::String { .. } => "string",
            ColumnType::Number { .. } => "number",
            ColumnType::Float { .. } => "float",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Bytes { .. } => "bytes",
            ColumnType::Any => "any",
        }
    }
}

/// Immutable descriptor of one model column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    primary_key: bool,
    default: Value,
    doc: Option<String>,
}

impl Column {
    /// Nullable, non-key column with a `NULL` default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            default: Value::Null,
            doc: None,
        }
    }

    /// Mark as (part of) the primary key. Implies `NOT NULL`.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Reject `NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Value used when a row lacks this column.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Free-form documentation, surfaced by [`Model::describe_columns`].
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Validate a value for this column, returning the normalized value.
    pub fn validate(&self, value: impl Into<Value>) -> OrmResult<Value> {
        validate::validate(self, value.into())
    }
}

/// Column metadata for external tooling (schema generation, forms).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    /// Zero-based position in the model.
    pub position: usize,
    pub name: String,
    #[serde(flatten)]
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, PartialEq)]
struct ModelInner {
    name: String,
    columns: Vec<Column>,
}

/// A named, ordered set of column descriptors. Cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Create a model, checking that column names are valid and unique.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> OrmResult<Self> {
        let name = name.into();
        for (i, column) in columns.iter().enumerate() {
            validate_unquoted(&column.name)?;
            if columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(OrmError::validation(format!(
                    "Duplicate column '{}' in model '{name}'",
                    column.name
                )));
            }
        }
        Ok(Self {
            inner: Arc::new(ModelInner { name, columns }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Column descriptors in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    /// Look up a column by name, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.inner.columns[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.inner
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// A record holding every column's default.
    pub fn record(&self) -> OrmResult<Record> {
        let values = self
            .columns()
            .iter()
            .map(|c| c.validate(c.default.clone()))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Record {
            model: self.clone(),
            values,
        })
    }

    /// Build a record from a row, matching columns by name and falling back to
    /// each column's default when the row lacks it. Extra row columns are ignored.
    pub fn from_row(&self, row: &Row) -> OrmResult<Record> {
        let values = self
            .columns()
            .iter()
            .map(|c| {
                let raw = row.get(&c.name).unwrap_or(&c.default).clone();
                c.validate(raw)
            })
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Record {
            model: self.clone(),
            values,
        })
    }

    /// Map rows to records, preserving order.
    pub fn from_rows(&self, rows: &[Row]) -> OrmResult<Vec<Record>> {
        rows.iter().map(|row| self.from_row(row)).collect()
    }

    /// Column metadata, computed on each call.
    pub fn describe_columns(&self) -> Vec<ColumnInfo> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(position, c)| ColumnInfo {
                position,
                name: c.name.clone(),
                column_type: c.column_type.clone(),
                nullable: c.nullable,
                primary_key: c.primary_key,
                default: c.default.clone(),
                doc: c.doc.clone(),
            })
            .collect()
    }
}

/// One model instance: a validated value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: Model,
    values: Vec<Value>,
}

impl Record {
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Value of a column (name matched ignoring ASCII case).
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.model.position(column).map(|i| &self.values[i])
    }

    /// Typed read of a column.
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self.get(column).ok_or_else(|| {
            OrmError::decode(
                column,
                format!("no such column in model '{}'", self.model.name()),
            )
        })?;
        T::from_value(value, column)
    }

    /// Validate and store a column value.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> OrmResult<()> {
        let i = self.model.position(column).ok_or_else(|| {
            OrmError::validation(format!(
                "Unknown column '{column}' for model '{}'",
                self.model.name()
            ))
        })?;
        self.values[i] = self.model.columns()[i].validate(value)?;
        Ok(())
    }

    /// Chainable [`Record::set`].
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        self.set(column, value)?;
        Ok(self)
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate `(column name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.model
            .columns()
            .iter()
            .map(Column::name)
            .zip(self.values.iter())
    }

    /// Column-name keyed bind parameters for DML.
    pub fn to_mapping(&self) -> BindParams {
        self.iter().collect()
    }

    /// Primary-key columns and their values.
    pub fn primary_key(&self) -> BindParams {
        self.model
            .columns()
            .iter()
            .zip(self.values.iter())
            .filter(|(c, _)| c.is_primary_key())
            .map(|(c, v)| (c.name(), v))
            .collect()
    }

    /// The record as a row, e.g. to feed it back through [`Model::from_row`].
    pub fn to_row(&self) -> Row {
        self.iter().collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model.name())?;
        let pk = self.primary_key();
        for (i, (name, value)) in pk.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            match value {
                Value::String(s) => write!(f, "{sep}{name}={s}")?,
                other => write!(f, "{sep}{name}={other}")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
