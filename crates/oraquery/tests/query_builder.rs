use oraquery::qb::{self, FilterRule, Operator, ValueRow};
use oraquery::rewrite::{counter_wrap, range_wrap, where_wrap};
use oraquery::Value;
use serde_json::json;

const PEDIDOS: &str = "SELECT id_pedido, cliente, fecha, estado FROM pedidos";

/// Rules as they arrive from a request body.
fn rules_from_json(json: serde_json::Value) -> Vec<FilterRule> {
    serde_json::from_value(json).unwrap()
}

fn rows_from_json(json: serde_json::Value) -> Vec<ValueRow> {
    let serde_json::Value::Array(items) = json else {
        panic!("expected an array of value rows");
    };
    items
        .into_iter()
        .map(|item| ValueRow::try_from(item).unwrap())
        .collect()
}

#[test]
fn order_screen_filters() {
    let filters = rules_from_json(json!([
        {"column": "estado"},
        {"column": "fecha", "operator": "between"},
        {"column": "cliente", "condition": {"operator": "like", "function": "upper"}}
    ]));
    let values = rows_from_json(json!([
        {"estado": "ACTIVO", "fecha": "2025-01-01", "cliente": "%ACME%"},
        {"estado": "PENDIENTE", "fecha": "2025-01-31"}
    ]));

    let base = where_wrap(PEDIDOS);
    let built = qb::build(&base, &filters, &values).unwrap();

    assert_eq!(
        built.sql(),
        format!(
            "{base}\nAND estado IN (:estado, :estado_copy1)\
             \nAND fecha BETWEEN :fecha AND :fecha_copy1\
             \nAND UPPER(cliente) LIKE :cliente"
        )
    );
    let names: Vec<_> = built.params().names().collect();
    assert_eq!(
        names,
        ["estado", "estado_copy1", "fecha", "fecha_copy1", "cliente"]
    );
    assert_eq!(built.params().get("cliente"), Some(&Value::from("%ACME%")));
}

#[test]
fn rules_without_values_leave_base_untouched() {
    let filters = rules_from_json(json!([
        {"column": "estado"},
        {"column": "fecha", "operator": "between"}
    ]));
    let base = where_wrap(PEDIDOS);

    let built = qb::build(&base, &filters, &[]).unwrap();
    assert_eq!(built.sql(), base);
    assert!(built.params().is_empty());

    let unrelated = rows_from_json(json!([{"total": 10}]));
    let built = qb::build(&base, &filters, &unrelated).unwrap();
    assert_eq!(built.sql(), base);
}

#[test]
fn between_needs_exactly_two_values() {
    let filters = [FilterRule::new("fecha").operator(Operator::Between)];
    let base = where_wrap(PEDIDOS);

    let one = rows_from_json(json!([{"fecha": "2025-01-01"}]));
    let err = qb::build(&base, &filters, &one).unwrap_err();
    assert!(err.is_validation());

    let three = rows_from_json(json!([{"fecha": "a"}, {"fecha": "b"}, {"fecha": "c"}]));
    let err = qb::build(&base, &filters, &three).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn unknown_operator_means_equal() {
    let filters = rules_from_json(json!([{"column": "estado", "operator": "contains"}]));
    let values = rows_from_json(json!([{"estado": "ACTIVO"}]));
    let built = qb::build(&where_wrap(PEDIDOS), &filters, &values).unwrap();
    assert!(built.sql().ends_with("AND estado = :estado"));
}

#[test]
fn nested_value_rows_are_rejected() {
    let err = ValueRow::try_from(json!({"estado": ["ACTIVO"]})).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn injected_column_names_are_rejected() {
    let filters = rules_from_json(json!([{"column": "estado; DROP TABLE pedidos"}]));
    let values = rows_from_json(json!([{"estado": "x"}]));
    let err = qb::build(&where_wrap(PEDIDOS), &filters, &values).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn full_listing_pipeline() {
    let filters = [FilterRule::new("estado")];
    let values = [ValueRow::new().with("estado", "ACTIVO")];
    let built = qb::build(&where_wrap(PEDIDOS), &filters, &values).unwrap();

    let page = range_wrap(built.sql(), 20, 10).unwrap();
    assert!(page.ends_with("AND estado = :estado\nOFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"));

    let count = counter_wrap(&page);
    assert!(count.starts_with("SELECT COUNT(*) AS COUNTER FROM (\nSELECT * FROM (\n"));
    assert!(count.ends_with("FETCH NEXT 10 ROWS ONLY\n) QUERY_COUNT"));
}
