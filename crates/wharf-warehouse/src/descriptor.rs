//! Table and column descriptors as the warehouse's metadata API returns them.
//!
//! Field names follow the REST JSON shape so descriptors can be read straight
//! from `tables.get` responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cardinality marker of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Declared kind, e.g. `INT64`, `INTEGER`, `RECORD`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: FieldMode,
    /// Child fields of a `RECORD`/`STRUCT` column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: FieldMode::Nullable,
            fields: Vec::new(),
        }
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            ..Self::new(name, "RECORD")
        }
    }

    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn repeated(self) -> Self {
        self.with_mode(FieldMode::Repeated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableReference {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    pub fn dataset(&self) -> DatasetReference {
        DatasetReference::new(&self.project_id, &self.dataset_id)
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub project_id: String,
    pub dataset_id: String,
}

impl DatasetReference {
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
        }
    }
}

impl fmt::Display for DatasetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project_id, self.dataset_id)
    }
}

/// Time-based partitioning. Without `field` the table is partitioned on the
/// warehouse's ingestion-time pseudo column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePartitioning {
    #[serde(rename = "type", default = "default_partition_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

fn default_partition_kind() -> String {
    "DAY".to_string()
}

impl TimePartitioning {
    pub fn ingestion_time() -> Self {
        Self {
            kind: default_partition_kind(),
            field: None,
        }
    }

    pub fn on_field(field: impl Into<String>) -> Self {
        Self {
            kind: default_partition_kind(),
            field: Some(field.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    #[serde(rename = "tableReference")]
    pub reference: TableReference,
    #[serde(default)]
    pub schema: TableSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_partitioning: Option<TimePartitioning>,
}

impl TableDescriptor {
    pub fn new(reference: TableReference, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            reference,
            schema: TableSchema { fields },
            time_partitioning: None,
        }
    }

    pub fn partitioned(mut self, partitioning: TimePartitioning) -> Self {
        self.time_partitioning = Some(partitioning);
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.schema.fields
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rest_shape() {
        let json = r#"{
            "tableReference": {"projectId": "p", "datasetId": "d", "tableId": "t"},
            "schema": {"fields": [
                {"name": "id", "type": "INTEGER", "mode": "REQUIRED"},
                {"name": "tags", "type": "STRING", "mode": "REPEATED"},
                {"name": "payload", "type": "RECORD", "fields": [
                    {"name": "x", "type": "FLOAT"}
                ]}
            ]},
            "timePartitioning": {"type": "DAY", "field": "ts"}
        }"#;
        let table = TableDescriptor::from_json(json).unwrap();
        assert_eq!(table.reference.to_string(), "p.d.t");
        assert_eq!(table.fields().len(), 3);
        assert_eq!(table.fields()[0].mode, FieldMode::Required);
        assert_eq!(table.fields()[1].mode, FieldMode::Repeated);
        assert_eq!(table.fields()[2].mode, FieldMode::Nullable);
        assert_eq!(table.fields()[2].fields[0].field_type, "FLOAT");
        assert_eq!(
            table.time_partitioning,
            Some(TimePartitioning::on_field("ts"))
        );
    }

    #[test]
    fn partitioning_kind_defaults_to_day() {
        let tp: TimePartitioning = serde_json::from_str("{}").unwrap();
        assert_eq!(tp, TimePartitioning::ingestion_time());
    }
}
