use super::*;
use serde_json::json;

const BASE: &str = "SELECT * FROM pedidos WHERE 1=1";

fn rows(column: &str, values: &[&str]) -> Vec<ValueRow> {
    values
        .iter()
        .map(|v| ValueRow::new().with(column, *v))
        .collect()
}

// ==================== Operator ====================

#[test]
fn operator_symbols() {
    assert_eq!(Operator::Equal.symbol(), "=");
    assert_eq!(Operator::NotEqual.symbol(), "!=");
    assert_eq!(Operator::Gt.symbol(), ">");
    assert_eq!(Operator::Gte.symbol(), ">=");
    assert_eq!(Operator::Lt.symbol(), "<");
    assert_eq!(Operator::Lte.symbol(), "<=");
    assert_eq!(Operator::Like.symbol(), "LIKE");
    assert_eq!(Operator::In.symbol(), "IN");
    assert_eq!(Operator::Between.symbol(), "BETWEEN");
}

#[test]
fn operator_parse_is_lenient() {
    assert_eq!(Operator::parse("BETWEEN"), Operator::Between);
    assert_eq!(Operator::parse(" not_equal "), Operator::NotEqual);
    assert_eq!(Operator::parse("contains"), Operator::Equal);
    assert_eq!(Operator::from(String::from("gte")), Operator::Gte);
}

#[test]
fn filter_rule_deserializes_with_defaults() {
    let rule: FilterRule = serde_json::from_value(json!({"column": "estado"})).unwrap();
    assert_eq!(rule, FilterRule::new("estado"));

    let rule: FilterRule = serde_json::from_value(json!({
        "column": "nombre",
        "operator": "LIKE",
        "function": "upper"
    }))
    .unwrap();
    assert_eq!(rule.operator, Operator::Like);
    assert_eq!(rule.function.as_deref(), Some("upper"));
}

#[test]
fn filter_rule_accepts_nested_condition() {
    let rule: FilterRule = serde_json::from_value(json!({
        "column": "fecha",
        "condition": {"operator": "between", "function": "trunc"}
    }))
    .unwrap();
    assert_eq!(
        rule,
        FilterRule::new("fecha").operator(Operator::Between).function("trunc")
    );

    let rule: FilterRule = serde_json::from_value(json!({
        "column": "total",
        "operator": "gte",
        "condition": {"operator": "lt"}
    }))
    .unwrap();
    assert_eq!(rule.operator, Operator::Gte);

    let flat = serde_json::to_value(&rule).unwrap();
    assert_eq!(flat, json!({"column": "total", "operator": "gte"}));
}

// ==================== Dispatch ====================

#[test]
fn no_values_is_noop() {
    let filters = [FilterRule::new("estado"), FilterRule::new("fecha").operator("between")];
    let values = rows("cliente", &["42"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(built.sql(), BASE);
    assert!(built.params().is_empty());
}

#[test]
fn single_equal_uses_bare_bind() {
    let filters = [FilterRule::new("estado")];
    let values = rows("estado", &["ACTIVO"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(built.sql(), format!("{BASE}\nAND estado = :estado"));
    assert_eq!(built.params().len(), 1);
    assert_eq!(built.params().get("estado"), Some(&Value::from("ACTIVO")));
}

#[test]
fn single_value_uses_declared_symbol() {
    let filters = [
        FilterRule::new("total").operator(Operator::Gte),
        FilterRule::new("estado").operator(Operator::NotEqual),
    ];
    let values = vec![ValueRow::new().with("total", 100).with("estado", "ANULADO")];
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(
        built.sql(),
        format!("{BASE}\nAND total >= :total\nAND estado != :estado")
    );
}

#[test]
fn multiple_values_force_in() {
    let filters = [FilterRule::new("estado")];
    let values = rows("estado", &["ACTIVO", "PENDIENTE"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert!(built.sql().contains("AND estado IN (:estado, :estado_copy1)"));
    let params: Vec<_> = built.params().iter().collect();
    assert_eq!(
        params,
        [
            ("estado", &Value::from("ACTIVO")),
            ("estado_copy1", &Value::from("PENDIENTE")),
        ]
    );
}

#[test]
fn in_forced_even_for_comparison_operators() {
    let filters = [FilterRule::new("total").operator(Operator::Gt)];
    let values = rows("total", &["1", "2", "3"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert!(built
        .sql()
        .ends_with("AND total IN (:total, :total_copy1, :total_copy2)"));
}

#[test]
fn explicit_in_with_single_value() {
    let filters = [FilterRule::new("estado").operator(Operator::In)];
    let values = rows("estado", &["ACTIVO"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert!(built.sql().ends_with("AND estado IN (:estado)"));
}

#[test]
fn between_pair() {
    let filters = [FilterRule::new("fecha").operator("between")];
    let values = rows("fecha", &["2025-01-01", "2025-01-31"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert!(built
        .sql()
        .contains("AND fecha BETWEEN :fecha AND :fecha_copy1"));
    assert_eq!(built.params().get("fecha"), Some(&Value::from("2025-01-01")));
    assert_eq!(
        built.params().get("fecha_copy1"),
        Some(&Value::from("2025-01-31"))
    );
}

#[test]
fn between_wrong_arity_names_column_and_count() {
    let filters = [FilterRule::new("fecha").operator(Operator::Between)];

    let err = build(BASE, &filters, &rows("fecha", &["2025-01-01"])).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("'fecha'"));
    assert!(err.to_string().contains("got 1"));

    let err = build(BASE, &filters, &rows("fecha", &["a", "b", "c"])).unwrap_err();
    assert!(err.to_string().contains("got 3"));
}

#[test]
fn function_wraps_column_not_bind() {
    let filters = [FilterRule::new("nombre")
        .operator(Operator::Like)
        .function("upper")];
    let values = rows("nombre", &["%GÓMEZ%"]);
    let built = build(BASE, &filters, &values).unwrap();
    assert!(built.sql().ends_with("AND UPPER(nombre) LIKE :nombre"));
    assert!(built.params().contains("nombre"));
}

#[test]
fn blank_function_is_ignored() {
    let filters = [FilterRule::new("nombre").function("  ")];
    let built = build(BASE, &filters, &rows("nombre", &["x"])).unwrap();
    assert!(built.sql().ends_with("AND nombre = :nombre"));
}

// ==================== Bind naming ====================

#[test]
fn same_column_in_two_rules_never_collides() {
    let filters = [
        FilterRule::new("total").operator(Operator::Gte),
        FilterRule::new("total").operator(Operator::Lt),
    ];
    let values = vec![ValueRow::new().with("total", 10)];
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(
        built.sql(),
        format!("{BASE}\nAND total >= :total\nAND total < :total_copy1")
    );
    assert_eq!(built.params().len(), 2);
}

#[test]
fn values_keep_row_order_and_skip_missing() {
    let filters = [FilterRule::new("estado"), FilterRule::new("cliente")];
    let values = vec![
        ValueRow::new().with("estado", "A").with("cliente", 7),
        ValueRow::new().with("cliente", 8),
        ValueRow::new().with("estado", "B"),
    ];
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(
        built.sql(),
        format!(
            "{BASE}\nAND estado IN (:estado, :estado_copy1)\nAND cliente IN (:cliente, :cliente_copy1)"
        )
    );
    let names: Vec<_> = built.params().names().collect();
    assert_eq!(names, ["estado", "estado_copy1", "cliente", "cliente_copy1"]);
}

#[test]
fn null_value_still_binds() {
    let filters = [FilterRule::new("baja")];
    let values = vec![ValueRow::new().with("baja", Value::Null)];
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(built.params().get("baja"), Some(&Value::Null));
}

// ==================== Validation / formatting ====================

#[test]
fn rejects_unsafe_column_and_function() {
    let values = rows("estado", &["x"]);
    let err = build(BASE, &[FilterRule::new("estado; DROP TABLE t")], &values).unwrap_err();
    assert!(err.is_validation());

    let err = build(BASE, &[FilterRule::new("estado").function("upper(")], &values).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn invalid_column_rejected_even_without_values() {
    let err = build(BASE, &[FilterRule::new("1bad")], &[]).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn base_trailing_whitespace_trimmed() {
    let filters = [FilterRule::new("estado")];
    let built = build("SELECT * FROM t WHERE 1=1 \n\t", &filters, &rows("estado", &["x"])).unwrap();
    assert_eq!(built.sql(), "SELECT * FROM t WHERE 1=1\nAND estado = :estado");
}

#[test]
fn builder_is_reusable_and_stateless() {
    let filters = [FilterRule::new("estado")];
    let values = rows("estado", &["ACTIVO", "PENDIENTE"]);
    let qb = QueryBuilder::new(BASE, &filters, &values);
    let first = qb.build().unwrap();
    let second = qb.build().unwrap();
    assert_eq!(first, second);
    let (sql, params) = second.into_parts();
    assert!(sql.contains(":estado_copy1"));
    assert_eq!(params.len(), 2);
}

#[test]
fn copy_suffix_skips_names_taken_by_other_columns() {
    let filters = [FilterRule::new("a"), FilterRule::new("a_copy1")];
    let values = vec![
        ValueRow::new().with("a", 1),
        ValueRow::new().with("a", 2),
        ValueRow::new().with("a_copy1", 99),
    ];
    let built = build(BASE, &filters, &values).unwrap();
    assert_eq!(
        built.sql(),
        format!("{BASE}\nAND a IN (:a, :a_copy1)\nAND a_copy1 = :a_copy1_copy1")
    );
    let params: Vec<_> = built.params().iter().collect();
    assert_eq!(
        params,
        [
            ("a", &Value::Int(1)),
            ("a_copy1", &Value::Int(2)),
            ("a_copy1_copy1", &Value::Int(99)),
        ]
    );
}

#[test]
fn bind_names_differing_only_in_case_are_distinct() {
    let filters = [FilterRule::new("estado"), FilterRule::new("ESTADO")];
    let values = vec![ValueRow::new().with("estado", "A").with("ESTADO", "B")];
    let built = build(BASE, &filters, &values).unwrap();
    assert!(built.sql().ends_with("AND estado = :estado\nAND ESTADO = :ESTADO_copy1"));
    assert_eq!(built.params().len(), 2);
    assert_eq!(built.params().get("ESTADO_copy1"), Some(&Value::from("B")));
}
