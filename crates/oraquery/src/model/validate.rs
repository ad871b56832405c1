//! Per-column value validation and normalization.

use super::{Column, ColumnType, MAX_STRING_BYTES};
use crate::error::{OrmError, OrmResult};
use crate::value::{Value, byte_size};
use chrono::NaiveTime;

/// Validate `value` for `column`, returning the value to store.
///
/// Integral floats become `Int` for number columns, integers become `Float`
/// for float columns, floats are rounded half-up to the column scale and dates
/// are promoted to midnight for datetime columns.
pub(crate) fn validate(column: &Column, value: Value) -> OrmResult<Value> {
    let name = column.name();
    if value.is_null() {
        if !column.is_nullable() {
            return Err(OrmError::validation(format!(
                "Field '{name}' cannot be null"
            )));
        }
        return Ok(Value::Null);
    }

    match column.column_type() {
        ColumnType::Any => Ok(value),
        ColumnType::String {
            max_bytes,
            min_length,
        } => {
            let Value::String(s) = &value else {
                return Err(expected(name, "string", &value));
            };
            if s.chars().count() < *min_length {
                return Err(OrmError::validation(format!(
                    "Field '{name}' is shorter than minimum of {min_length} characters"
                )));
            }
            let limit = (*max_bytes).min(MAX_STRING_BYTES);
            if byte_size(&value) > limit {
                return Err(OrmError::validation(format!(
                    "Field '{name}' exceeds maximum of {limit} bytes"
                )));
            }
            Ok(value)
        }
        ColumnType::Number { min, max } => {
            let n = match &value {
                Value::Int(i) => *i,
                Value::Float(_) => value
                    .as_i64()
                    .ok_or_else(|| expected(name, "integer", &value))?,
                _ => return Err(expected(name, "integer", &value)),
            };
            if let Some(min) = min {
                if n < *min {
                    return Err(OrmError::validation(format!(
                        "Field '{name}' is less than minimum value {min}"
                    )));
                }
            }
            if let Some(max) = max {
                if n > *max {
                    return Err(OrmError::validation(format!(
                        "Field '{name}' is greater than maximum value {max}"
                    )));
                }
            }
            Ok(Value::Int(n))
        }
        ColumnType::Float {
            precision,
            scale,
            min,
            max,
        } => {
            let raw = match &value {
                Value::Float(f) if f.is_finite() => *f,
                Value::Int(i) => *i as f64,
                _ => return Err(expected(name, "number", &value)),
            };
            let (rounded, digits) = round_half_up(raw, *scale);
            if digits > *precision as usize {
                return Err(OrmError::validation(format!(
                    "Total digits in '{name}' exceed {precision}"
                )));
            }
            if let Some(min) = min {
                if rounded < *min {
                    return Err(OrmError::validation(format!(
                        "Value for '{name}' is less than minimum {min}"
                    )));
                }
            }
            if let Some(max) = max {
                if rounded > *max {
                    return Err(OrmError::validation(format!(
                        "Value for '{name}' exceeds maximum {max}"
                    )));
                }
            }
            Ok(Value::Float(rounded))
        }
        ColumnType::Date => match value {
            Value::Date(_) | Value::DateTime(_) => Ok(value),
            other => Err(expected(name, "date", &other)),
        },
        ColumnType::DateTime => match value {
            Value::DateTime(_) => Ok(value),
            Value::Date(d) => Ok(Value::DateTime(d.and_time(NaiveTime::MIN))),
            other => Err(expected(name, "datetime", &other)),
        },
        ColumnType::Bytes { max_bytes } => {
            if !matches!(value, Value::Bytes(_)) {
                return Err(expected(name, "bytes", &value));
            }
            if byte_size(&value) > *max_bytes {
                return Err(OrmError::validation(format!(
                    "Field '{name}' exceeds max size of {max_bytes} bytes"
                )));
            }
            Ok(value)
        }
    }
}

fn expected(column: &str, kind: &str, value: &Value) -> OrmError {
    OrmError::type_error(format!(
        "Expected {kind} for '{column}', got {}",
        value.kind()
    ))
}

/// Round `value` half away from zero to `scale` decimals, working on its
/// shortest decimal representation so that `2.675` rounds to `2.68`.
///
/// Returns the rounded value and its count of significant digits.
pub(crate) fn round_half_up(value: f64, scale: Option<u32>) -> (f64, usize) {
    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let Some(scale) = scale.map(|s| s as usize) else {
        return (value, significant_digits(int_part, frac_part));
    };
    if frac_part.len() <= scale {
        // Quantizing pads with zeros, which count as digits.
        let padded = format!("{frac_part:0<scale$}");
        return (value, significant_digits(int_part, &padded));
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(scale))
        .map(|b| b - b'0')
        .collect();
    if frac_part.as_bytes()[scale] >= b'5' {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - scale;
    let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    let (int_digits, frac_digits) = text.split_at(split);
    let count = significant_digits(int_digits, frac_digits);
    let text = if frac_digits.is_empty() {
        int_digits.to_string()
    } else {
        format!("{int_digits}.{frac_digits}")
    };
    let rounded: f64 = text.parse().unwrap_or(value.abs());
    (rounded.copysign(value), count)
}

fn significant_digits(int_part: &str, frac_part: &str) -> usize {
    let all = format!("{int_part}{frac_part}");
    all.trim_start_matches('0').len().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_on_decimal_representation() {
        assert_eq!(round_half_up(2.675, Some(2)).0, 2.68);
        assert_eq!(round_half_up(2.674, Some(2)).0, 2.67);
        assert_eq!(round_half_up(-1.005, Some(2)).0, -1.01);
        assert_eq!(round_half_up(9.999, Some(2)).0, 10.0);
        assert_eq!(round_half_up(0.5, Some(0)).0, 1.0);
        assert_eq!(round_half_up(3.1, Some(4)).0, 3.1);
    }

    #[test]
    fn counts_significant_digits() {
        assert_eq!(round_half_up(0.05, None).1, 1);
        assert_eq!(round_half_up(100.0, Some(2)).1, 5);
        assert_eq!(round_half_up(123.456, None).1, 6);
        assert_eq!(round_half_up(9.999, Some(2)).1, 4);
    }
}
