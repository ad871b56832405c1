//! Dynamic WHERE composition over a base statement.
//!
//! A [`QueryBuilder`] takes a base SQL fragment that already ends in an always-true
//! predicate (`WHERE 1=1`), a list of [`FilterRule`]s and a list of [`ValueRow`]s,
//! and appends one `AND ...` line per rule that has values, using named binds.
//!
//! # Example
//!
//! ```
//! use oraquery::qb::{FilterRule, Operator, QueryBuilder, ValueRow};
//!
//! let filters = [
//!     FilterRule::new("estado"),
//!     FilterRule::new("fecha").operator(Operator::Between),
//! ];
//! let values = [
//!     ValueRow::new().with("estado", "ACTIVO"),
//!     ValueRow::new().with("estado", "PENDIENTE"),
//!     ValueRow::new().with("fecha", "2025-01-01"),
//!     ValueRow::new().with("fecha", "2025-01-31"),
//! ];
//!
//! let built = QueryBuilder::new("SELECT * FROM pedidos WHERE 1=1", &filters, &values).build()?;
//! assert_eq!(
//!     built.sql(),
//!     "SELECT * FROM pedidos WHERE 1=1\n\
//!      AND estado IN (:estado, :estado_copy1)\n\
//!      AND fecha BETWEEN :fecha AND :fecha_copy1"
//! );
//! assert_eq!(built.params().len(), 4);
//! # Ok::<(), oraquery::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use crate::ident::validate_unquoted;
use crate::value::{BindParams, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[cfg(test)]
mod tests;

/// Comparison applied by a [`FilterRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Operator {
    /// `=`
    #[default]
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `LIKE`
    Like,
    /// `IN (...)`, also forced whenever a column collects more than one value
    In,
    /// `BETWEEN :a AND :b`, exactly two values
    Between,
}

impl Operator {
    /// Parse an operator name, ignoring case and surrounding whitespace.
    ///
    /// Unknown names fall back to [`Operator::Equal`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "equal" => Operator::Equal,
            "not_equal" => Operator::NotEqual,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "like" => Operator::Like,
            "in" => Operator::In,
            "between" => Operator::Between,
            _ => Operator::Equal,
        }
    }

    /// SQL symbol for this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
        }
    }

    /// Canonical lower-case name (`not_equal`, `between`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not_equal",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::In => "in",
            Operator::Between => "between",
        }
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Operator::parse(name)
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Operator::parse(&name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dynamic WHERE condition: column, operator and optional SQL function.
///
/// Deserializes from `{"column": "nombre", "operator": "like", "function": "upper"}`
/// or the nested `{"column": "nombre", "condition": {"operator": "like"}}` form;
/// top-level keys win. `operator` defaults to `equal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilterRule")]
pub struct FilterRule {
    /// Unquoted column identifier; also the base of generated bind names.
    pub column: String,
    /// Declared comparison.
    pub operator: Operator,
    /// Scalar function wrapped around the column (`UPPER(nombre)`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

#[derive(Deserialize)]
struct RawFilterRule {
    column: String,
    #[serde(default)]
    operator: Option<Operator>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    condition: Option<RawCondition>,
}

#[derive(Default, Deserialize)]
struct RawCondition {
    #[serde(default)]
    operator: Option<Operator>,
    #[serde(default)]
    function: Option<String>,
}

impl From<RawFilterRule> for FilterRule {
    fn from(raw: RawFilterRule) -> Self {
        let condition = raw.condition.unwrap_or_default();
        Self {
            column: raw.column,
            operator: raw.operator.or(condition.operator).unwrap_or_default(),
            function: raw.function.or(condition.function),
        }
    }
}

impl FilterRule {
    /// Equality rule on `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator: Operator::Equal,
            function: None,
        }
    }

    /// Set the operator.
    pub fn operator(mut self, operator: impl Into<Operator>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Wrap the column in a SQL function (`UPPER`, `TRUNC`, ...).
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Normalized function name: trimmed, upper-cased, `None` when blank.
    fn normalized_function(&self) -> OrmResult<Option<String>> {
        let Some(raw) = self.function.as_deref() else {
            return Ok(None);
        };
        let name = raw.trim().to_ascii_uppercase();
        if name.is_empty() {
            return Ok(None);
        }
        validate_unquoted(&name)?;
        Ok(Some(name))
    }
}

/// One row of candidate values: column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    entries: Vec<(String, Value)>,
}

impl ValueRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chainable insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set the value for a column, replacing any previous one.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Value for `column`, if present (exact name match).
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = ValueRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl From<BindParams> for ValueRow {
    fn from(params: BindParams) -> Self {
        params.into_iter().collect()
    }
}

/// A flat JSON object of scalars; anything else is a type error.
impl TryFrom<serde_json::Value> for ValueRow {
    type Error = OrmError;

    fn try_from(json: serde_json::Value) -> OrmResult<Self> {
        BindParams::try_from(json).map(ValueRow::from)
    }
}

/// Final SQL plus its bind parameters. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    sql: String,
    params: BindParams,
}

impl BuiltQuery {
    pub(crate) fn new(sql: String, params: BindParams) -> Self {
        Self { sql, params }
    }

    /// The generated SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind parameters in placeholder order.
    pub fn params(&self) -> &BindParams {
        &self.params
    }

    /// Split into `(sql, params)`.
    pub fn into_parts(self) -> (String, BindParams) {
        (self.sql, self.params)
    }
}

/// Composes filter clauses onto a base statement. One builder per build.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    base_sql: &'a str,
    filters: &'a [FilterRule],
    values: &'a [ValueRow],
}

/// Per-build mutable state: bind counters, parameters and generated clauses.
#[derive(Default)]
struct BuildState {
    bind_counter: HashMap<String, usize>,
    /// Emitted bind names, lower-cased: Oracle binds ignore case.
    emitted: HashSet<String>,
    params: BindParams,
    clauses: Vec<String>,
}

impl BuildState {
    /// Next unique bind name for `column`: `col`, `col_copy1`, `col_copy2`, ...
    ///
    /// Names already emitted for another column are skipped, so `a_copy1` as a
    /// column never reuses the second bind of `a`.
    fn next_bind(&mut self, column: &str, value: &Value) -> String {
        let count = self.bind_counter.entry(column.to_string()).or_insert(0);
        let bind = loop {
            let candidate = if *count == 0 {
                column.to_string()
            } else {
                format!("{column}_copy{count}")
            };
            *count += 1;
            if self.emitted.insert(candidate.to_ascii_lowercase()) {
                break candidate;
            }
        };
        self.params.insert(bind.clone(), value.clone());
        bind
    }

    fn push_single(&mut self, sql_col: &str, column: &str, value: &Value, op: Operator) {
        let bind = self.next_bind(column, value);
        self.clauses
            .push(format!("AND {sql_col} {} :{bind}", op.symbol()));
    }

    fn push_in(&mut self, sql_col: &str, column: &str, values: &[&Value]) {
        let binds: Vec<String> = values
            .iter()
            .map(|v| format!(":{}", self.next_bind(column, v)))
            .collect();
        self.clauses
            .push(format!("AND {sql_col} IN ({})", binds.join(", ")));
    }

    fn push_between(&mut self, sql_col: &str, column: &str, values: &[&Value]) -> OrmResult<()> {
        let [lower, upper] = values else {
            return Err(OrmError::validation(format!(
                "BETWEEN requires exactly 2 values for '{column}', got {}",
                values.len()
            )));
        };
        let lower = self.next_bind(column, lower);
        let upper = self.next_bind(column, upper);
        self.clauses
            .push(format!("AND {sql_col} BETWEEN :{lower} AND :{upper}"));
        Ok(())
    }
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder over a base statement ending in an always-true predicate.
    pub fn new(base_sql: &'a str, filters: &'a [FilterRule], values: &'a [ValueRow]) -> Self {
        Self {
            base_sql,
            filters,
            values,
        }
    }

    /// All values supplied for `column`, in value-row order.
    fn collect_values(&self, column: &str) -> Vec<&'a Value> {
        self.values.iter().filter_map(|row| row.get(column)).collect()
    }

    /// Produce the final SQL and bind map.
    ///
    /// Rules whose column has no value in any row are skipped. A rule with a
    /// single value uses its operator symbol, several values (or `in`) become an
    /// `IN` list, and `between` requires exactly two values.
    pub fn build(&self) -> OrmResult<BuiltQuery> {
        let mut state = BuildState::default();

        for rule in self.filters {
            validate_unquoted(&rule.column)?;
            let function = rule.normalized_function()?;

            let vals = self.collect_values(&rule.column);
            if vals.is_empty() {
                continue;
            }

            let sql_col = match &function {
                Some(func) => format!("{func}({})", rule.column),
                None => rule.column.clone(),
            };

            match (rule.operator, vals.as_slice()) {
                (Operator::Between, _) => state.push_between(&sql_col, &rule.column, &vals)?,
                (op, [single]) if op != Operator::In => {
                    state.push_single(&sql_col, &rule.column, single, op)
                }
                _ => state.push_in(&sql_col, &rule.column, &vals),
            }
        }

        let mut sql = self.base_sql.trim_end().to_string();
        for clause in &state.clauses {
            sql.push('\n');
            sql.push_str(clause);
        }

        tracing::trace!(
            target: "oraquery.qb",
            clauses = state.clauses.len(),
            params = state.params.len(),
            "built dynamic query"
        );

        Ok(BuiltQuery::new(sql, state.params))
    }
}

/// Shorthand for `QueryBuilder::new(base_sql, filters, values).build()`.
pub fn build(base_sql: &str, filters: &[FilterRule], values: &[ValueRow]) -> OrmResult<BuiltQuery> {
    QueryBuilder::new(base_sql, filters, values).build()
}
