//! End-to-end: resolve a table, bind parameters, execute, reshape.

use chrono::NaiveDate;
use wharf_core::config::AdapterConfig;
use wharf_core::schema::{DataType, Schema};
use wharf_core::types::{Dtype, Value};
use wharf_exec::{
    Error, ExecutionMode, Expr, QueryState, ScalarParameter, Statement, WarehouseBackend,
};
use wharf_params::{BoundParameter, WireType, WireValue};
use wharf_warehouse::{
    FieldDescriptor, MemoryWarehouse, ResultCursor, TableDescriptor, TableReference,
    TimePartitioning,
};

const SQL: &str = "SELECT id, amount, PARTITIONTIME FROM `shop.sales.orders` \
                   WHERE DATE(PARTITIONTIME) >= @since AND id < @param_2";

fn setup() -> (MemoryWarehouse, WarehouseBackend<MemoryWarehouse>) {
    let wh = MemoryWarehouse::new();
    wh.add_table(
        TableDescriptor::new(
            TableReference::new("shop", "sales", "orders"),
            vec![
                FieldDescriptor::new("id", "INTEGER"),
                FieldDescriptor::new("amount", "FLOAT"),
            ],
        )
        .partitioned(TimePartitioning::ingestion_time()),
    )
    .unwrap();
    let backend = WarehouseBackend::new(wh.clone(), "billing", "shop.sales", AdapterConfig::default());
    (wh, backend)
}

fn statement(
    backend: &WarehouseBackend<MemoryWarehouse>,
    since: &ScalarParameter,
    limit: &ScalarParameter,
) -> Statement {
    let table = backend.table("orders", None).expect("table resolves");
    let partition = table.partition.as_ref().expect("partitioned");
    let pt = table.column(&partition.exposed).expect("exposed partition column");

    let filter = Expr::call(
        "and",
        vec![
            Expr::call(
                "ge",
                vec![
                    Expr::call("date", vec![pt], DataType::DATE),
                    since.to_expr().alias("since"),
                ],
                DataType::BOOLEAN,
            ),
            Expr::call(
                "lt",
                vec![table.column("id").unwrap(), limit.to_expr()],
                DataType::BOOLEAN,
            ),
        ],
        DataType::BOOLEAN,
    );
    let expr = Expr::call("filter", vec![table.to_expr(), filter], DataType::BOOLEAN);
    Statement::new(SQL, expr, table.schema.clone())
}

#[test]
fn test_parameterized_query_round_trip() {
    let (wh, backend) = setup();
    let since = ScalarParameter::new(1, DataType::DATE);
    let limit = ScalarParameter::new(2, DataType::INT64);
    let stmt = statement(&backend, &since, &limit);

    wh.set_result(
        SQL,
        ResultCursor::new(
            vec!["PARTITIONTIME".into(), "amount".into(), "id".into()],
            vec![
                vec![Value::Str("2020-01-02 00:00:00".into()), Value::Int(3), Value::Int(1)],
                vec![Value::Str("2020-01-03 00:00:00".into()), Value::Float(4.5), Value::Int(2)],
            ],
        ),
    )
    .unwrap();

    let frame = backend
        .execute(
            stmt,
            &[
                (since, Value::Str("2020-01-01".into())),
                (limit, Value::Int(100)),
            ],
            ExecutionMode::Sync,
        )
        .expect("query succeeds");

    assert_eq!(frame.column_names(), vec!["id", "amount", "PARTITIONTIME"]);
    assert_eq!(frame.num_rows(), 2);
    let amount = frame.column("amount").unwrap();
    assert_eq!(amount.dtype, Dtype::Float64);
    assert_eq!(amount.values, vec![Value::Float(3.0), Value::Float(4.5)]);
    assert!(matches!(
        frame.column("PARTITIONTIME").unwrap().values[0],
        Value::Timestamp(_)
    ));

    let subs = wh.submissions().unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].billing_project, "billing");
    assert_eq!(
        subs[0].parameters,
        vec![
            BoundParameter::Scalar {
                name: "since".into(),
                wire_type: WireType::Date,
                value: WireValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            },
            BoundParameter::Scalar {
                name: "param_2".into(),
                wire_type: WireType::Int64,
                value: WireValue::Int64(100),
            },
        ]
    );
}

#[test]
fn test_query_handle_lifecycle() {
    let (wh, backend) = setup();
    let since = ScalarParameter::new(1, DataType::DATE);
    let limit = ScalarParameter::new(2, DataType::INT64);
    let stmt = statement(&backend, &since, &limit);
    wh.set_result(SQL, ResultCursor::new(vec![], vec![])).unwrap();

    let mut query = backend
        .query(stmt, &[(limit, Value::Int(5))])
        .expect("binds");
    assert_eq!(query.state(), QueryState::ParametersBound);
    assert_eq!(query.parameters().len(), 1);

    // The canned result lacks the schema's columns.
    let err = query.execute().unwrap_err();
    assert!(matches!(err, Error::Core(wharf_core::Error::ColumnNotFound(_))));
    assert_eq!(query.state(), QueryState::Failed);
    assert!(matches!(query.execute(), Err(Error::InvalidState(QueryState::Failed))));
}

#[test]
fn test_remote_errors_propagate_unchanged() {
    let (wh, backend) = setup();
    let since = ScalarParameter::new(1, DataType::DATE);
    let limit = ScalarParameter::new(2, DataType::INT64);
    wh.set_failure(SQL, "Quota exceeded").unwrap();

    let err = backend
        .execute(statement(&backend, &since, &limit), &[], ExecutionMode::Sync)
        .unwrap_err();
    assert_eq!(err.to_string(), "Warehouse error: Quota exceeded");
}

#[test]
fn test_async_fails_before_submission() {
    let (wh, backend) = setup();
    let since = ScalarParameter::new(1, DataType::DATE);
    let limit = ScalarParameter::new(2, DataType::INT64);
    let stmt = statement(&backend, &since, &limit);

    let err = backend
        .execute(stmt, &[(since, Value::Str("2020-01-01".into()))], ExecutionMode::Async)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert!(wh.submissions().unwrap().is_empty());
}

#[test]
fn test_bad_parameter_value_stops_before_submission() {
    let (wh, backend) = setup();
    let since = ScalarParameter::new(1, DataType::DATE);
    let limit = ScalarParameter::new(2, DataType::INT64);
    let stmt = statement(&backend, &since, &limit);

    let err = backend
        .execute(stmt, &[(since, Value::Bool(true))], ExecutionMode::Sync)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Params(wharf_params::Error::NoMatchingBinding { role: "date", value_type: "bool" })
    ));
    assert!(wh.submissions().unwrap().is_empty());
}

#[test]
fn test_schema_of_resolved_table() {
    let (_, backend) = setup();
    let table = backend.table("orders", None).unwrap();
    assert_eq!(
        table.schema,
        Schema::from_pairs([
            ("id", DataType::INT64),
            ("amount", DataType::DOUBLE),
            ("PARTITIONTIME", DataType::TIMESTAMP),
        ])
        .unwrap()
    );
    assert_eq!(table.reference.to_string(), "shop.sales.orders");
    assert!(backend.exists_table("orders", Some("shop.sales")).unwrap());
    assert!(!backend.exists_table("orders", Some("sales")).unwrap());
}
