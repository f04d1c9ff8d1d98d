//! In-memory warehouse.
//!
//! Holds table descriptors per dataset and canned results keyed by statement
//! text. Every submission is recorded so callers can inspect what was sent.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use wharf_params::BoundParameter;

use crate::client::{QueryJob, ResultCursor, WarehouseClient};
use crate::descriptor::{DatasetReference, TableDescriptor, TableReference};
use crate::error::{Error, Result};

/// A query as the warehouse received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub job_id: String,
    pub statement: String,
    pub parameters: Vec<BoundParameter>,
    pub billing_project: String,
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows(ResultCursor),
    Failure(String),
}

#[derive(Default)]
struct State {
    datasets: BTreeMap<DatasetReference, BTreeMap<String, TableDescriptor>>,
    outcomes: HashMap<String, Outcome>,
    submissions: Vec<Submission>,
}

/// Thread-safe in-memory warehouse; clones share state.
#[derive(Clone, Default)]
pub struct MemoryWarehouse {
    state: Arc<Mutex<State>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Remote("warehouse state lock poisoned".to_string()))
    }

    pub fn add_dataset(&self, dataset: DatasetReference) -> Result<()> {
        self.lock()?.datasets.entry(dataset).or_default();
        Ok(())
    }

    /// Register a table, creating its dataset if needed.
    pub fn add_table(&self, table: TableDescriptor) -> Result<()> {
        let mut state = self.lock()?;
        state
            .datasets
            .entry(table.reference.dataset())
            .or_default()
            .insert(table.reference.table_id.clone(), table);
        Ok(())
    }

    /// Rows returned for every later submission of exactly `statement`.
    pub fn set_result(&self, statement: impl Into<String>, cursor: ResultCursor) -> Result<()> {
        self.lock()?
            .outcomes
            .insert(statement.into(), Outcome::Rows(cursor));
        Ok(())
    }

    /// Make `statement` fail remotely with `message`.
    pub fn set_failure(&self, statement: impl Into<String>, message: impl Into<String>) -> Result<()> {
        self.lock()?
            .outcomes
            .insert(statement.into(), Outcome::Failure(message.into()));
        Ok(())
    }

    pub fn submissions(&self) -> Result<Vec<Submission>> {
        Ok(self.lock()?.submissions.clone())
    }
}

impl WarehouseClient for MemoryWarehouse {
    type Job = MemoryJob;

    fn get_table(&self, reference: &TableReference) -> Result<TableDescriptor> {
        let state = self.lock()?;
        state
            .datasets
            .get(&reference.dataset())
            .and_then(|tables| tables.get(&reference.table_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("table {reference}")))
    }

    fn get_dataset(&self, reference: &DatasetReference) -> Result<DatasetReference> {
        let state = self.lock()?;
        if state.datasets.contains_key(reference) {
            Ok(reference.clone())
        } else {
            Err(Error::NotFound(format!("dataset {reference}")))
        }
    }

    fn list_datasets(&self, project: &str) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .datasets
            .keys()
            .filter(|d| d.project_id == project)
            .map(|d| d.dataset_id.clone())
            .collect())
    }

    fn list_tables(&self, dataset: &DatasetReference) -> Result<Vec<String>> {
        let state = self.lock()?;
        state
            .datasets
            .get(dataset)
            .map(|tables| tables.keys().cloned().collect())
            .ok_or_else(|| Error::NotFound(format!("dataset {dataset}")))
    }

    fn query(
        &self,
        statement: &str,
        parameters: &[BoundParameter],
        billing_project: &str,
    ) -> Result<MemoryJob> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let mut state = self.lock()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            job_id = %job_id,
            billing_project,
            parameters = parameters.len(),
            "query submitted"
        );

        state.submissions.push(Submission {
            job_id: job_id.clone(),
            statement: statement.to_string(),
            parameters: parameters.to_vec(),
            billing_project: billing_project.to_string(),
        });
        let outcome = state
            .outcomes
            .get(statement)
            .cloned()
            .unwrap_or_else(|| Outcome::Failure(format!("no result registered for: {statement}")));
        Ok(MemoryJob { job_id, outcome })
    }
}

pub struct MemoryJob {
    job_id: String,
    outcome: Outcome,
}

impl QueryJob for MemoryJob {
    fn job_id(&self) -> &str {
        &self.job_id
    }

    fn wait(self) -> Result<ResultCursor> {
        match self.outcome {
            Outcome::Rows(cursor) => Ok(cursor),
            Outcome::Failure(message) => Err(Error::Remote(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use wharf_core::types::Value;

    use super::*;
    use crate::descriptor::FieldDescriptor;

    fn table(dataset: &str, name: &str) -> TableDescriptor {
        TableDescriptor::new(
            TableReference::new("proj", dataset, name),
            vec![FieldDescriptor::new("id", "INT64")],
        )
    }

    #[test]
    fn test_tables_and_datasets() {
        let wh = MemoryWarehouse::new();
        wh.add_table(table("a", "t1")).unwrap();
        wh.add_table(table("a", "t2")).unwrap();
        wh.add_dataset(DatasetReference::new("proj", "b")).unwrap();
        wh.add_dataset(DatasetReference::new("other", "c")).unwrap();

        assert_eq!(wh.list_datasets("proj").unwrap(), vec!["a", "b"]);
        assert_eq!(
            wh.list_tables(&DatasetReference::new("proj", "a")).unwrap(),
            vec!["t1", "t2"]
        );
        assert!(wh
            .get_table(&TableReference::new("proj", "a", "t1"))
            .is_ok());

        let missing = wh.get_table(&TableReference::new("proj", "a", "nope"));
        assert!(missing.unwrap_err().is_not_found());
        let missing = wh.get_dataset(&DatasetReference::new("proj", "zzz"));
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_query_records_submission() {
        let wh = MemoryWarehouse::new();
        let cursor = ResultCursor::new(vec!["n".into()], vec![vec![Value::Int(1)]]);
        wh.set_result("SELECT 1 AS n", cursor.clone()).unwrap();

        let job = wh.query("SELECT 1 AS n", &[], "billing").unwrap();
        let job_id = job.job_id().to_string();
        assert_eq!(job.wait().unwrap(), cursor);

        let subs = wh.submissions().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].job_id, job_id);
        assert_eq!(subs[0].billing_project, "billing");
    }

    #[test]
    fn test_failures_surface_on_wait() {
        let wh = MemoryWarehouse::new();
        wh.set_failure("SELECT boom", "quota exceeded").unwrap();

        let err = wh.query("SELECT boom", &[], "p").unwrap().wait().unwrap_err();
        assert!(matches!(err, Error::Remote(ref m) if m == "quota exceeded"));

        let err = wh.query("SELECT unknown", &[], "p").unwrap().wait().unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(wh.submissions().unwrap().len(), 2);
    }
}
