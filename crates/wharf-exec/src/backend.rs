//! Project/dataset-aware facade over a `WarehouseClient`.

use regex::Regex;

use wharf_core::config::AdapterConfig;
use wharf_core::schema::Schema;
use wharf_core::types::{Frame, Value};
use wharf_warehouse::{
    import_table_schema, partition_column, DatasetReference, TableReference, WarehouseClient,
};

use crate::error::{Error, Result};
use crate::expr::{Expr, ScalarParameter};
use crate::query::{Query, Statement};

/// Split a `project.dataset` string into the project holding the data and the
/// dataset, keeping `project` as the billing project. Anything that is not
/// exactly two dot-separated parts is a bare dataset living in `project`.
///
/// Returns `(data_project, billing_project, dataset)`.
pub fn parse_project_and_dataset(project: &str, dataset: &str) -> (String, String, String) {
    let parts: Vec<&str> = dataset.split('.').collect();
    match parts.as_slice() {
        [data_project, dataset] => (
            data_project.to_string(),
            project.to_string(),
            dataset.to_string(),
        ),
        _ => (project.to_string(), project.to_string(), dataset.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Sync,
    Async,
}

/// The partition column as stored (`physical`) and as callers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionColumn {
    pub physical: String,
    pub exposed: String,
}

/// A resolved table: identity, reconciled schema, and partition column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub reference: TableReference,
    pub schema: Schema,
    pub partition: Option<PartitionColumn>,
}

impl Table {
    pub fn to_expr(&self) -> Expr {
        Expr::Table {
            name: self.reference.to_string(),
            schema: self.schema.clone(),
        }
    }

    pub fn column(&self, name: &str) -> Option<Expr> {
        self.schema
            .get(name)
            .map(|ty| Expr::column(name, ty.clone()))
    }
}

pub struct WarehouseBackend<C> {
    client: C,
    data_project: String,
    billing_project: String,
    dataset: String,
    config: AdapterConfig,
}

impl<C: WarehouseClient> WarehouseBackend<C> {
    /// `dataset_id` may be `project.dataset` to read data from another project
    /// while billing `project_id` (or the configured billing project).
    pub fn new(client: C, project_id: &str, dataset_id: &str, config: AdapterConfig) -> Self {
        let (data_project, billing_project, dataset) =
            parse_project_and_dataset(project_id, dataset_id);
        let billing_project = config.billing_project.clone().unwrap_or(billing_project);
        Self {
            client,
            data_project,
            billing_project,
            dataset,
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn project_id(&self) -> &str {
        &self.data_project
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset
    }

    pub fn billing_project(&self) -> &str {
        &self.billing_project
    }

    /// `(project, dataset)` for an optional `[project.]dataset` name; `None`
    /// means the current dataset.
    fn resolve(&self, database: Option<&str>) -> DatasetReference {
        let (project, _, dataset) = match database {
            Some(db) => parse_project_and_dataset(&self.billing_project, db),
            None => parse_project_and_dataset(
                &self.billing_project,
                &format!("{}.{}", self.data_project, self.dataset),
            ),
        };
        DatasetReference::new(project, dataset)
    }

    pub fn set_database(&mut self, name: &str) {
        let DatasetReference {
            project_id,
            dataset_id,
        } = self.resolve(Some(name));
        self.data_project = project_id;
        self.dataset = dataset_id;
    }

    pub fn fully_qualified_name(&self, name: &str, database: Option<&str>) -> String {
        format!("{}.{}", self.resolve(database), name)
    }

    fn table_reference(&self, name: &str, database: Option<&str>) -> TableReference {
        let dataset = self.resolve(database);
        TableReference::new(dataset.project_id, dataset.dataset_id, name)
    }

    /// Resolve a table. The partition column, if any, is exposed under the
    /// configured `partition_col` name.
    pub fn table(&self, name: &str, database: Option<&str>) -> Result<Table> {
        let reference = self.table_reference(name, database);
        let descriptor = self.client.get_table(&reference)?;
        let mut schema = import_table_schema(&descriptor)?;

        let partition = partition_column(&descriptor).map(|physical| PartitionColumn {
            physical: physical.to_string(),
            exposed: self
                .config
                .partition_col
                .clone()
                .unwrap_or_else(|| physical.to_string()),
        });
        if let Some(p) = &partition {
            if p.physical != p.exposed {
                schema = schema.rename(&[(p.physical.as_str(), p.exposed.as_str())])?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            table = %reference,
            partition = ?partition.as_ref().map(|p| &p.exposed),
            "resolved table"
        );

        Ok(Table {
            reference,
            schema,
            partition,
        })
    }

    /// Declared schema plus partition column, under its warehouse name.
    pub fn get_schema(&self, name: &str, database: Option<&str>) -> Result<Schema> {
        let descriptor = self
            .client
            .get_table(&self.table_reference(name, database))?;
        Ok(import_table_schema(&descriptor)?)
    }

    pub fn exists_database(&self, name: &str) -> Result<bool> {
        match self.client.get_dataset(&self.resolve(Some(name))) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists_table(&self, name: &str, database: Option<&str>) -> Result<bool> {
        match self.client.get_table(&self.table_reference(name, database)) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Datasets of the data project; `like` is a regex matched at the start
    /// of each name.
    pub fn list_databases(&self, like: Option<&str>) -> Result<Vec<String>> {
        let names = self.client.list_datasets(&self.data_project)?;
        filter_like(names, like)
    }

    pub fn list_tables(&self, like: Option<&str>, database: Option<&str>) -> Result<Vec<String>> {
        let names = self.client.list_tables(&self.resolve(database))?;
        filter_like(names, like)
    }

    pub fn query(
        &self,
        statement: Statement,
        params: &[(ScalarParameter, Value)],
    ) -> Result<Query<'_, C>> {
        Query::new(&self.client, statement, &self.billing_project, params)
    }

    /// Run `statement` to completion. Only synchronous execution exists;
    /// `ExecutionMode::Async` fails before anything is sent.
    pub fn execute(
        &self,
        statement: Statement,
        params: &[(ScalarParameter, Value)],
        mode: ExecutionMode,
    ) -> Result<Frame> {
        if mode == ExecutionMode::Async {
            return Err(Error::UnsupportedOperation(
                "asynchronous queries are not implemented",
            ));
        }
        self.query(statement, params)?.execute()
    }
}

fn filter_like(names: Vec<String>, like: Option<&str>) -> Result<Vec<String>> {
    let Some(pattern) = like.filter(|p| !p.is_empty()) else {
        return Ok(names);
    };
    let re = Regex::new(&format!("^(?:{pattern})"))?;
    Ok(names.into_iter().filter(|n| re.is_match(n)).collect())
}

#[cfg(test)]
mod tests {
    use wharf_core::schema::DataType;
    use wharf_warehouse::{FieldDescriptor, MemoryWarehouse, TableDescriptor, TimePartitioning};

    use super::*;

    fn warehouse() -> MemoryWarehouse {
        let wh = MemoryWarehouse::new();
        wh.add_table(
            TableDescriptor::new(
                TableReference::new("data-proj", "sales", "orders"),
                vec![
                    FieldDescriptor::new("id", "INTEGER"),
                    FieldDescriptor::new("amount", "FLOAT"),
                ],
            )
            .partitioned(TimePartitioning::ingestion_time()),
        )
        .unwrap();
        wh.add_table(TableDescriptor::new(
            TableReference::new("data-proj", "sales", "order_items"),
            vec![FieldDescriptor::new("id", "INT64")],
        ))
        .unwrap();
        wh.add_table(TableDescriptor::new(
            TableReference::new("data-proj", "sales", "customers"),
            vec![FieldDescriptor::new("id", "INT64")],
        ))
        .unwrap();
        wh.add_dataset(DatasetReference::new("data-proj", "staging"))
            .unwrap();
        wh
    }

    fn backend(config: AdapterConfig) -> WarehouseBackend<MemoryWarehouse> {
        WarehouseBackend::new(warehouse(), "billing-proj", "data-proj.sales", config)
    }

    #[test]
    fn test_parse_project_and_dataset() {
        assert_eq!(
            parse_project_and_dataset("ibis-gbq", "foo-bar.my_dataset"),
            (
                "foo-bar".to_string(),
                "ibis-gbq".to_string(),
                "my_dataset".to_string()
            )
        );
        assert_eq!(
            parse_project_and_dataset("ibis-gbq", "my_dataset"),
            (
                "ibis-gbq".to_string(),
                "ibis-gbq".to_string(),
                "my_dataset".to_string()
            )
        );
        let (data, _, dataset) = parse_project_and_dataset("p", "a.b.c");
        assert_eq!((data.as_str(), dataset.as_str()), ("p", "a.b.c"));
    }

    #[test]
    fn test_identity() {
        let be = backend(AdapterConfig::default());
        assert_eq!(be.project_id(), "data-proj");
        assert_eq!(be.dataset_id(), "sales");
        assert_eq!(be.billing_project(), "billing-proj");
        assert_eq!(
            be.fully_qualified_name("orders", None),
            "data-proj.sales.orders"
        );

        let cfg = AdapterConfig {
            billing_project: Some("other-bill".into()),
            ..AdapterConfig::default()
        };
        assert_eq!(backend(cfg).billing_project(), "other-bill");
    }

    #[test]
    fn test_partition_column_renamed() {
        let be = backend(AdapterConfig::default());
        let table = be.table("orders", None).unwrap();
        assert_eq!(
            table.schema.names(),
            &["id".to_string(), "amount".to_string(), "PARTITIONTIME".to_string()]
        );
        assert_eq!(
            table.partition,
            Some(PartitionColumn {
                physical: "_PARTITIONTIME".into(),
                exposed: "PARTITIONTIME".into(),
            })
        );
        assert_eq!(table.column("amount"), Some(Expr::column("amount", DataType::DOUBLE)));

        let schema = be.get_schema("orders", None).unwrap();
        assert!(schema.contains("_PARTITIONTIME"));
    }

    #[test]
    fn test_partition_rename_disabled() {
        let cfg = AdapterConfig {
            partition_col: None,
            ..AdapterConfig::default()
        };
        let table = backend(cfg).table("orders", None).unwrap();
        assert!(table.schema.contains("_PARTITIONTIME"));
        assert_eq!(table.partition.unwrap().exposed, "_PARTITIONTIME");

        let plain = backend(AdapterConfig::default())
            .table("customers", None)
            .unwrap();
        assert_eq!(plain.partition, None);
    }

    #[test]
    fn test_exists() {
        let be = backend(AdapterConfig::default());
        assert!(be.exists_table("orders", None).unwrap());
        assert!(!be.exists_table("nope", None).unwrap());
        assert!(be.exists_database("data-proj.staging").unwrap());
        assert!(!be.exists_database("data-proj.missing").unwrap());
        // A bare dataset name resolves against the billing project.
        assert!(!be.exists_database("staging").unwrap());
        assert!(matches!(
            be.table("nope", None),
            Err(Error::Warehouse(wharf_warehouse::Error::NotFound(_)))
        ));
    }

    #[test]
    fn test_list_like_is_anchored() {
        let be = backend(AdapterConfig::default());
        assert_eq!(
            be.list_tables(Some("order"), None).unwrap(),
            vec!["order_items", "orders"]
        );
        assert!(be.list_tables(Some("items"), None).unwrap().is_empty());
        assert_eq!(be.list_tables(None, None).unwrap().len(), 3);
        assert_eq!(be.list_databases(Some("st")).unwrap(), vec!["staging"]);
        assert_eq!(be.list_databases(Some("")).unwrap().len(), 2);
        assert!(matches!(
            be.list_databases(Some("(")),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_set_database() {
        let mut be = backend(AdapterConfig::default());
        be.set_database("data-proj.staging");
        assert_eq!(be.dataset_id(), "staging");
        assert_eq!(be.project_id(), "data-proj");
        be.set_database("scratch");
        assert_eq!(be.project_id(), "billing-proj");
        assert_eq!(be.dataset_id(), "scratch");
    }

    #[test]
    fn test_async_rejected_before_submission() {
        let be = backend(AdapterConfig::default());
        let stmt = Statement::new(
            "SELECT 1 AS n",
            Expr::literal(Value::Int(1), DataType::INT64).alias("n"),
            Schema::from_pairs([("n", DataType::INT64)]).unwrap(),
        );
        let err = be.execute(stmt, &[], ExecutionMode::Async).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
        assert!(be.client().submissions().unwrap().is_empty());
    }
}
