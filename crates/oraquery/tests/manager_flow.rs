use oraquery::catalog::{self, CatalogView};
use oraquery::manager::DmlKind;
use oraquery::mock::MockProvider;
use oraquery::session::UnitOfWork;
use oraquery::{
    BindParams, Column, ColumnType, DynamicManager, FilterRule, Manager, ManagerConfig,
    ManagerHooks, Model, PageRange, Row, Session, Statements, Value, ValueRow,
};
use serde_json::json;

fn pedidos_model() -> Model {
    Model::new(
        "pedidos",
        vec![
            Column::new("id_pedido", ColumnType::number()).primary_key(),
            Column::new("cliente", ColumnType::varchar(100)).not_null(),
            Column::new("estado", ColumnType::varchar(20)).default("PENDIENTE"),
            Column::new("total", ColumnType::decimal(12, 2)),
        ],
    )
    .unwrap()
}

fn pedidos(provider: &MockProvider) -> Manager<MockProvider> {
    Manager::new(
        provider.clone(),
        pedidos_model(),
        Statements::new("SELECT id_pedido, cliente, estado, total FROM pedidos")
            .with_insert(
                "INSERT INTO pedidos (id_pedido, cliente, estado, total) \
                 VALUES (:id_pedido, :cliente, :estado, :total)",
            )
            .with_update("UPDATE pedidos SET estado = :estado WHERE id_pedido = :id_pedido"),
    )
}

fn historial(provider: &MockProvider) -> Manager<MockProvider> {
    let model = Model::new(
        "historial",
        vec![
            Column::new("id_pedido", ColumnType::number()).primary_key(),
            Column::new("evento", ColumnType::varchar(40)).primary_key(),
        ],
    )
    .unwrap();
    Manager::new(
        provider.clone(),
        model,
        Statements::new("SELECT id_pedido, evento FROM historial")
            .with_insert("INSERT INTO historial (id_pedido, evento) VALUES (:id_pedido, :evento)"),
    )
}

fn pedido_row(id: i64, cliente: &str, estado: &str) -> Row {
    Row::new()
        .with("ID_PEDIDO", id)
        .with("CLIENTE", cliente)
        .with("ESTADO", estado)
        .with("TOTAL", 99.5)
}

#[test]
fn two_managers_share_one_transaction() {
    let provider = MockProvider::new();
    let pedidos = pedidos(&provider);
    let historial = historial(&provider);

    let pedido = pedidos
        .model()
        .from_row(&pedido_row(7, "ACME", "PENDIENTE"))
        .unwrap();
    let evento = historial
        .model()
        .from_row(&Row::new().with("id_pedido", 7).with("evento", "CREADO"))
        .unwrap();

    let mut uow = UnitOfWork::begin(&provider).unwrap();
    pedidos.insert(pedido, Some(uow.session())).unwrap();
    historial.insert(evento, Some(uow.session())).unwrap();
    assert_eq!(provider.commits(), 0);
    uow.commit().unwrap();

    assert_eq!(provider.sessions(), 1);
    assert_eq!(provider.commits(), 1);
    assert_eq!(provider.closes(), 1);
    let statements = provider.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements.iter().all(|s| s.session_id == 1));
    assert_eq!(statements[1].params.get("evento"), Some(&Value::from("CREADO")));
}

#[test]
fn failure_inside_shared_transaction_rolls_everything_back() {
    let provider = MockProvider::new();
    provider.push_affected(1);
    provider.push_execute_error("ORA-00001: unique constraint violated");
    let pedidos = pedidos(&provider);
    let historial = historial(&provider);

    let pedido = pedidos
        .model()
        .from_row(&pedido_row(7, "ACME", "PENDIENTE"))
        .unwrap();
    let evento = historial
        .model()
        .from_row(&Row::new().with("id_pedido", 7).with("evento", "CREADO"))
        .unwrap();

    let result = (|| -> oraquery::OrmResult<()> {
        let mut uow = UnitOfWork::begin(&provider)?;
        pedidos.insert(pedido, Some(uow.session()))?;
        historial.insert(evento, Some(uow.session()))?;
        uow.commit()
    })();

    assert!(result.is_err());
    assert_eq!(provider.commits(), 0);
    assert_eq!(provider.rollbacks(), 1);
    assert_eq!(provider.closes(), 1);
}

#[test]
fn update_hook_appends_history_in_the_same_session() {
    let provider = MockProvider::new();
    let audit = historial(&provider);
    let hooks = ManagerHooks::default().after_update(move |record, session| {
        let evento = audit
            .model()
            .from_row(
                &Row::new()
                    .with("id_pedido", record.try_get::<i64>("id_pedido")?)
                    .with("evento", "ACTUALIZADO"),
            )?;
        session.execute(
            audit.statements().dml(DmlKind::Insert).unwrap_or_default(),
            &evento.to_mapping(),
        )?;
        Ok(record)
    });
    let pedidos = pedidos(&provider).with_hooks(hooks);

    let pedido = pedidos
        .model()
        .from_row(&pedido_row(3, "ACME", "ENVIADO"))
        .unwrap();
    pedidos.update(pedido, None).unwrap();

    let statements = provider.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].sql.starts_with("UPDATE pedidos"));
    assert!(statements[1].sql.starts_with("INSERT INTO historial"));
    assert_eq!(statements[1].session_id, statements[0].session_id);
    assert_eq!(provider.commits(), 1);
}

#[test]
fn filtered_page_with_count() {
    let provider = MockProvider::new();
    provider.push_rows(vec![Row::new().with("COUNTER", 2)]);
    provider.push_rows(vec![
        pedido_row(1, "ACME", "ACTIVO"),
        pedido_row(2, "GLOBEX", "ACTIVO"),
    ]);
    let pedidos = pedidos(&provider).with_config(ManagerConfig {
        rows_page: 50,
        ..ManagerConfig::default()
    });

    let filters: Vec<FilterRule> = serde_json::from_value(json!([{"column": "estado"}])).unwrap();
    let values = [ValueRow::new().with("estado", "ACTIVO")];
    let page = pedidos
        .list_page(&filters, &values, Some(PageRange::new(0, 2)), None)
        .unwrap();

    assert_eq!(page.count, 2);
    assert_eq!(page.result.len(), 2);
    assert_eq!(page.result[1].try_get::<String>("cliente").unwrap(), "GLOBEX");
    assert_eq!(page.page_count(), 1);

    let statements = provider.statements();
    assert!(statements[0].sql.starts_with("SELECT COUNT(*) AS COUNTER FROM ("));
    assert!(statements[1].sql.ends_with("OFFSET 0 ROWS FETCH NEXT 2 ROWS ONLY"));
    assert_eq!(statements[1].params.get("estado"), Some(&Value::from("ACTIVO")));
    assert_eq!(provider.sessions(), 1);
}

#[test]
fn record_survives_a_row_round_trip() {
    let model = pedidos_model();
    let record = model
        .from_row(&pedido_row(11, "INITECH", "ACTIVO"))
        .unwrap();
    let again = model.from_row(&record.to_row()).unwrap();
    assert_eq!(record, again);
    assert_eq!(record.to_mapping(), again.to_mapping());
}

#[test]
fn dynamic_params_override_builder_binds() {
    let provider = MockProvider::new();
    let dynamic = DynamicManager::new(provider.clone());

    let filters = [FilterRule::new("estado")];
    let values = [ValueRow::new().with("estado", "ACTIVO")];
    let extra = BindParams::new().with("estado", "ANULADO").with("desde", 2024);

    dynamic
        .fetch_all(
            "SELECT * FROM pedidos WHERE fecha >= :desde",
            &extra,
            &filters,
            &values,
            None,
        )
        .unwrap();

    let statement = &provider.statements()[0];
    assert_eq!(
        statement.sql,
        "SELECT * FROM pedidos WHERE fecha >= :desde\nAND estado = :estado"
    );
    assert_eq!(statement.params.get("estado"), Some(&Value::from("ANULADO")));
    assert_eq!(statement.params.get("desde"), Some(&Value::from(2024)));
}

#[test]
fn catalog_listing_maps_dictionary_rows() {
    let provider = MockProvider::new();
    provider.push_rows(vec![
        Row::new()
            .with("SEQUENCE_OWNER", "VENTAS")
            .with("SEQUENCE_NAME", "SEQ_PEDIDOS")
            .with("MIN_VALUE", 1)
            .with("MAX_VALUE", 9.999_999_999_999_999e27)
            .with("INCREMENT_BY", 1)
            .with("CYCLE_FLAG", "N")
            .with("ORDER_FLAG", "N")
            .with("CACHE_SIZE", 20)
            .with("LAST_NUMBER", 1041),
    ]);

    let sequences = catalog::all_sequences(provider.clone()).unwrap();
    let filters = [FilterRule::new("sequence_owner")];
    let values = [ValueRow::new().with("sequence_owner", "VENTAS")];
    let records = sequences.list(&filters, &values, None).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].try_get::<String>("sequence_name").unwrap(),
        "SEQ_PEDIDOS"
    );
    assert!(records[0].try_get::<f64>("max_value").unwrap() > i64::MAX as f64);
    assert!(provider
        .last_sql()
        .unwrap()
        .contains(CatalogView::AllSequences.select_sql().trim()));
    assert!(provider
        .last_sql()
        .unwrap()
        .ends_with("AND sequence_owner = :sequence_owner"));
}
