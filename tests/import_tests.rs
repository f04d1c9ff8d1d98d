//! Warehouse descriptors → schemas.

use wharf_core::schema::{DataType, Schema};
use wharf_warehouse::{
    import_table_schema, import_type, Error, FieldDescriptor, FieldMode, TableDescriptor,
    TableReference, TimePartitioning, NATIVE_PARTITION_COLUMN,
};

fn reference() -> TableReference {
    TableReference::new("proj", "ds", "t")
}

#[test]
fn test_repeated_record_imports_as_array_of_struct() {
    let field = FieldDescriptor::record(
        "r",
        vec![
            FieldDescriptor::new("z", "STRING"),
            FieldDescriptor::new("a", "INTEGER"),
            FieldDescriptor::new("m", "BOOLEAN").with_mode(FieldMode::Required),
        ],
    )
    .repeated();

    let ty = import_type(&field).expect("record with children");
    let DataType::Array(inner) = &ty else {
        panic!("expected array, got {ty}");
    };
    let DataType::Struct(st) = inner.as_ref() else {
        panic!("expected struct, got {inner}");
    };
    assert_eq!(st.names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    assert_eq!(st.field("a"), Some(&DataType::INT64));
    assert_eq!(st.field("m"), Some(&DataType::BOOLEAN));

    let empty = FieldDescriptor::record("r", vec![]).repeated();
    assert!(matches!(import_type(&empty), Err(Error::EmptyRecord(_))));
}

#[test]
fn test_partition_field_appended_when_undeclared() {
    let table = TableDescriptor::new(
        reference(),
        vec![
            FieldDescriptor::new("id", "INT64"),
            FieldDescriptor::new("v", "FLOAT"),
        ],
    )
    .partitioned(TimePartitioning::on_field("ts"));

    let schema = import_table_schema(&table).unwrap();
    assert_eq!(
        schema,
        Schema::from_pairs([
            ("id", DataType::INT64),
            ("v", DataType::DOUBLE),
            ("ts", DataType::TIMESTAMP),
        ])
        .unwrap()
    );
}

#[test]
fn test_partition_field_not_duplicated_when_declared() {
    let table = TableDescriptor::new(
        reference(),
        vec![
            FieldDescriptor::new("ts", "DATE"),
            FieldDescriptor::new("id", "INT64"),
        ],
    )
    .partitioned(TimePartitioning::on_field("ts"));

    let schema = import_table_schema(&table).unwrap();
    assert_eq!(schema.len(), 2);
    // The declared type wins over the partition default.
    assert_eq!(schema.get("ts"), Some(&DataType::DATE));
}

#[test]
fn test_ingestion_time_partitioning_uses_native_column() {
    let table = TableDescriptor::new(reference(), vec![FieldDescriptor::new("id", "INT64")])
        .partitioned(TimePartitioning::ingestion_time());
    let schema = import_table_schema(&table).unwrap();
    assert_eq!(schema.get(NATIVE_PARTITION_COLUMN), Some(&DataType::TIMESTAMP));
}

#[test]
fn test_end_to_end_descriptor_import() {
    let json = r#"{
        "tableReference": {"projectId": "proj", "datasetId": "ds", "tableId": "events"},
        "schema": {"fields": [
            {"name": "id", "type": "INTEGER"},
            {"name": "payload", "type": "RECORD", "mode": "REPEATED", "fields": [
                {"name": "x", "type": "FLOAT"}
            ]}
        ]}
    }"#;
    let table = TableDescriptor::from_json(json).expect("valid descriptor");
    let schema = import_table_schema(&table).unwrap();

    let expected = Schema::from_pairs([
        ("id", DataType::INT64),
        (
            "payload",
            DataType::array(DataType::structure([("x", DataType::DOUBLE)]).unwrap()),
        ),
    ])
    .unwrap();
    assert_eq!(schema, expected);
    assert_eq!(
        schema.to_string(),
        "Schema {\n  id       int64\n  payload  array<struct<x: double>>\n}"
    );
}

#[test]
fn test_unrecognized_kinds_survive_import() {
    let table = TableDescriptor::new(
        reference(),
        vec![
            FieldDescriptor::new("geo", "GEOGRAPHY"),
            FieldDescriptor::new("n", "NUMERIC").repeated(),
        ],
    );
    let schema = import_table_schema(&table).unwrap();
    assert_eq!(
        schema.get("geo"),
        Some(&DataType::Unrecognized("GEOGRAPHY".into()))
    );
    assert_eq!(
        schema.get("n"),
        Some(&DataType::array(DataType::Unrecognized("NUMERIC".into())))
    );
}
