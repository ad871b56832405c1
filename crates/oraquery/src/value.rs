//! Scalar values and bind-parameter maps.
//!
//! [`Value`] is the single scalar type that crosses the session boundary, both as
//! a bind parameter and as a fetched column value.

use crate::error::{OrmError, OrmResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// A scalar SQL value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`
    #[default]
    Null,
    /// `VARCHAR2` / `CHAR` / `CLOB`
    String(String),
    /// Integral `NUMBER`
    Int(i64),
    /// Fractional `NUMBER` / `BINARY_DOUBLE`
    Float(f64),
    /// `DATE` without a meaningful time part
    Date(NaiveDate),
    /// `DATE` / `TIMESTAMP`
    DateTime(NaiveDateTime),
    /// `RAW` / `BLOB`
    Bytes(Vec<u8>),
}

impl Value {
    /// Whether this value is SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value (integral floats within `i64` range included).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            // `i64::MAX as f64` rounds up to 2^63, which is out of range.
            Value::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Number of bytes a value occupies once encoded (UTF-8 for strings).
///
/// Numbers and dates report 0: their storage size is not bounded by bytes.
pub fn byte_size(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        Value::Bytes(b) => b.len(),
        _ => 0,
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Typed extraction from a [`Value`].
///
/// Implemented for the Rust scalars that map onto Oracle column types. `Option<T>`
/// maps `NULL` to `None`; the plain types reject `NULL`.
pub trait FromValue: Sized {
    /// Convert a value, naming `column` in any decode error.
    fn from_value(value: &Value, column: &str) -> OrmResult<Self>;
}

fn mismatch(column: &str, expected: &str, value: &Value) -> OrmError {
    OrmError::decode(
        column,
        format!("expected {expected}, got {}", value.kind()),
    )
}

impl FromValue for Value {
    fn from_value(value: &Value, _column: &str) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(column, "string", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        value
            .as_i64()
            .ok_or_else(|| mismatch(column, "integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        let wide = i64::from_value(value, column)?;
        i32::try_from(wide)
            .map_err(|_| OrmError::decode(column, format!("{wide} out of range for i32")))
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        let wide = i64::from_value(value, column)?;
        u64::try_from(wide)
            .map_err(|_| OrmError::decode(column, format!("{wide} out of range for u64")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch(column, "number", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::String(s) if s == "Y" || s == "YES" || s == "TRUE" => Ok(true),
            Value::String(s) if s == "N" || s == "NO" || s == "FALSE" => Ok(false),
            other => Err(mismatch(column, "boolean flag", other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::DateTime(dt) => Ok(dt.date()),
            other => Err(mismatch(column, "date", other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            other => Err(mismatch(column, "datetime", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(mismatch(column, "bytes", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, column: &str) -> OrmResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value, column).map(Some)
        }
    }
}

/// Ordered map of bind name to value.
///
/// Keys are unique. Insertion order is preserved, which keeps the map in the same
/// order as the placeholders generated for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindParams {
    entries: Vec<(String, Value)>,
}

impl BindParams {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Chainable [`BindParams::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a value by bind name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Whether a bind name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Apply `other` on top of this map; colliding keys take `other`'s value.
    pub fn merge(&mut self, other: &BindParams) {
        for (k, v) in &other.entries {
            self.insert(k.clone(), v.clone());
        }
    }

    /// Bind names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get the number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comma-separated `:name` placeholder list, in insertion order.
    pub fn placeholders(&self) -> String {
        self.entries
            .iter()
            .map(|(k, _)| format!(":{k}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for BindParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = BindParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl IntoIterator for BindParams {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Convert JSON into [`BindParams`], accepting only a flat object of scalars.
///
/// Nested objects and arrays fail with [`OrmError::Type`], which is what routine
/// calls require of their parameters.
impl TryFrom<serde_json::Value> for BindParams {
    type Error = OrmError;

    fn try_from(json: serde_json::Value) -> OrmResult<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(OrmError::type_error(format!(
                "parameters must be a mapping, got {}",
                json_kind(&json)
            )));
        };
        let mut params = BindParams::new();
        for (k, v) in map {
            let value = match v {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::Bool(b) => Value::from(b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => Value::Int(i),
                    None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                serde_json::Value::String(s) => Value::String(s),
                other => {
                    return Err(OrmError::type_error(format!(
                        "parameter '{k}' must be a scalar, got {}",
                        json_kind(&other)
                    )));
                }
            };
            params.insert(k, value);
        }
        Ok(params)
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Anything accepted as routine-call parameters.
pub trait IntoBindParams {
    /// Convert into a flat bind map.
    fn into_bind_params(self) -> OrmResult<BindParams>;
}

impl IntoBindParams for BindParams {
    fn into_bind_params(self) -> OrmResult<BindParams> {
        Ok(self)
    }
}

impl IntoBindParams for &BindParams {
    fn into_bind_params(self) -> OrmResult<BindParams> {
        Ok(self.clone())
    }
}

impl IntoBindParams for serde_json::Value {
    fn into_bind_params(self) -> OrmResult<BindParams> {
        BindParams::try_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_keeps_position_on_overwrite() {
        let mut p = BindParams::new();
        p.insert("a", 1);
        p.insert("b", 2);
        p.insert("a", 3);
        let names: Vec<_> = p.names().collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(p.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn merge_overrides() {
        let mut base = BindParams::new().with("estado", "ACTIVO").with("id", 1);
        base.merge(&BindParams::new().with("id", 2).with("extra", "x"));
        assert_eq!(base.get("id"), Some(&Value::Int(2)));
        assert_eq!(base.placeholders(), ":estado, :id, :extra");
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }

    #[test]
    fn typed_reads() {
        assert_eq!(i64::from_value(&Value::Float(4.0), "n").unwrap(), 4);
        assert!(i64::from_value(&Value::Float(4.5), "n").is_err());
        assert!(i64::from_value(&Value::Float(1e20), "n").is_err());
        assert!(i64::from_value(&Value::Float(-1e20), "n").is_err());
        assert_eq!(Value::Float(i64::MIN as f64).as_i64(), Some(i64::MIN));
        assert_eq!(Value::Float(9_007_199_254_740_992.0).as_i64(), Some(9_007_199_254_740_992));
        assert_eq!(Option::<String>::from_value(&Value::Null, "s").unwrap(), None);
        let err = String::from_value(&Value::Int(1), "nombre").unwrap_err();
        assert!(err.to_string().contains("nombre"));
    }

    #[test]
    fn byte_size_counts_utf8() {
        assert_eq!(byte_size(&Value::from("Hola")), 4);
        assert_eq!(byte_size(&Value::from("á")), 2);
        assert_eq!(byte_size(&Value::Bytes(b"abc".to_vec())), 3);
        assert_eq!(byte_size(&Value::Null), 0);
    }

    #[test]
    fn json_params_must_be_flat() {
        let p = BindParams::try_from(json!({"p_id": 1, "p_name": "x", "p_none": null})).unwrap();
        assert_eq!(p.len(), 3);
        assert!(BindParams::try_from(json!([1, 2])).unwrap_err().is_type_error());
        assert!(
            BindParams::try_from(json!({"nested": {"a": 1}}))
                .unwrap_err()
                .is_type_error()
        );
    }
}
