//! Warehouse column kinds → `DataType`.

use wharf_core::schema::{DataType, PrimitiveType, Schema};

use crate::descriptor::{FieldDescriptor, FieldMode, TableDescriptor};
use crate::error::{Error, Result};

/// Pseudo column of ingestion-time partitioned tables.
pub const NATIVE_PARTITION_COLUMN: &str = "_PARTITIONTIME";

const RECORD_KINDS: &[&str] = &["RECORD", "STRUCT"];

const LEGACY_KINDS: &[(&str, &str)] = &[
    ("INTEGER", "INT64"),
    ("FLOAT", "FLOAT64"),
    ("BOOLEAN", "BOOL"),
];

const STANDARD_KINDS: &[(&str, PrimitiveType)] = &[
    ("INT64", PrimitiveType::Int64),
    ("FLOAT64", PrimitiveType::Double),
    ("BOOL", PrimitiveType::Boolean),
    ("STRING", PrimitiveType::String),
    ("DATE", PrimitiveType::Date),
    ("DATETIME", PrimitiveType::Timestamp),
    ("TIME", PrimitiveType::Time),
    ("TIMESTAMP", PrimitiveType::Timestamp),
    ("BYTES", PrimitiveType::Binary),
];

fn lookup<T: Copy>(table: &[(&str, T)], kind: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == kind).map(|(_, v)| *v)
}

/// Type of one column.
///
/// Kinds missing from the tables come back as `DataType::Unrecognized` rather
/// than an error; parameter binding is where they get rejected.
pub fn import_type(field: &FieldDescriptor) -> Result<DataType> {
    let base = if RECORD_KINDS.contains(&field.field_type.as_str()) {
        if field.fields.is_empty() {
            return Err(Error::EmptyRecord(field.name.clone()));
        }
        let children = field
            .fields
            .iter()
            .map(|child| Ok((child.name.clone(), import_type(child)?)))
            .collect::<Result<Vec<_>>>()?;
        DataType::structure(children)?
    } else {
        let kind = lookup(LEGACY_KINDS, &field.field_type).unwrap_or(field.field_type.as_str());
        match lookup(STANDARD_KINDS, kind) {
            Some(p) => DataType::Primitive(p),
            None => DataType::Unrecognized(kind.to_string()),
        }
    };

    Ok(match field.mode {
        FieldMode::Repeated => DataType::array(base),
        FieldMode::Nullable | FieldMode::Required => base,
    })
}

/// Name of the table's time-partitioning column, if it is partitioned.
pub fn partition_column(table: &TableDescriptor) -> Option<&str> {
    table
        .time_partitioning
        .as_ref()
        .map(|tp| tp.field.as_deref().unwrap_or(NATIVE_PARTITION_COLUMN))
}

/// Schema of a table in declaration order, with the partition column appended
/// as a timestamp when the declared columns do not already include it.
pub fn import_table_schema(table: &TableDescriptor) -> Result<Schema> {
    let mut names = Vec::with_capacity(table.fields().len() + 1);
    let mut types = Vec::with_capacity(table.fields().len() + 1);
    for field in table.fields() {
        names.push(field.name.clone());
        types.push(import_type(field)?);
    }

    if let Some(col) = partition_column(table) {
        if !names.iter().any(|n| n == col) {
            names.push(col.to_string());
            types.push(DataType::TIMESTAMP);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        table = %table.reference,
        columns = names.len(),
        partition = ?partition_column(table),
        "imported table schema"
    );

    Ok(Schema::try_new(names, types)?)
}
