//! Pure SQL text rewriters used around the query builder.
//!
//! The usual pipeline is [`where_wrap`], then the builder appends filters,
//! then [`counter_wrap`] for the total and/or [`range_wrap`] for one page.

use crate::error::{OrmError, OrmResult};

/// Wrap `query` in a subquery with an always-true predicate so that `AND`
/// clauses can be appended safely.
pub fn where_wrap(query: &str) -> String {
    format!("SELECT * FROM (\n{}\n) WHERE 1=1", query.trim_end())
}

/// Wrap `query` so that it returns exactly one row with a `COUNTER` column.
pub fn counter_wrap(query: &str) -> String {
    format!(
        "SELECT COUNT(*) AS COUNTER FROM (\n{}\n) QUERY_COUNT",
        query.trim_end()
    )
}

/// Append `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` to `query`.
///
/// Negative `offset` or `limit` is a validation error.
pub fn range_wrap(query: &str, offset: i64, limit: i64) -> OrmResult<String> {
    if offset < 0 {
        return Err(OrmError::validation(format!(
            "offset must be non-negative, got {offset}"
        )));
    }
    if limit < 0 {
        return Err(OrmError::validation(format!(
            "limit must be non-negative, got {limit}"
        )));
    }
    Ok(format!(
        "{}\nOFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY",
        query.trim_end()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: &str = "SELECT id, estado FROM pedidos";

    #[test]
    fn where_wrap_adds_true_predicate() {
        assert_eq!(
            where_wrap(Q),
            "SELECT * FROM (\nSELECT id, estado FROM pedidos\n) WHERE 1=1"
        );
    }

    #[test]
    fn counter_wrap_aliases_counter() {
        let sql = counter_wrap(Q);
        assert!(sql.starts_with("SELECT COUNT(*) AS COUNTER FROM ("));
        assert!(sql.ends_with(") QUERY_COUNT"));
        assert!(sql.contains(Q));
    }

    #[test]
    fn range_wrap_appends_verbatim() {
        let sql = range_wrap(Q, 20, 10).unwrap();
        assert!(sql.ends_with("OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"));
        assert_eq!(sql, format!("{Q}\nOFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"));
    }

    #[test]
    fn range_wrap_rejects_negative() {
        assert!(range_wrap(Q, -1, 5).unwrap_err().is_validation());
        assert!(range_wrap(Q, 0, -5).unwrap_err().is_validation());
        assert!(range_wrap(Q, 0, 0).is_ok());
    }

    #[test]
    fn pipeline_composes() {
        let wrapped = where_wrap(Q);
        let paged = range_wrap(&wrapped, 0, 20).unwrap();
        let counted = counter_wrap(&paged);
        assert!(counted.contains("WHERE 1=1\nOFFSET 0 ROWS FETCH NEXT 20 ROWS ONLY\n) QUERY_COUNT"));
    }
}
