//! The boundary to the remote warehouse.
//!
//! Implementations own connection handling, auth and retries; none of that
//! happens on this side.

use serde::{Deserialize, Serialize};

use wharf_core::types::{Frame, Value};
use wharf_params::BoundParameter;

use crate::descriptor::{DatasetReference, TableDescriptor, TableReference};
use crate::error::Result;

/// Rows of a finished query, in result-column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultCursor {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Transpose the rows into a frame with machine dtypes.
    pub fn into_frame(self) -> wharf_core::Result<Frame> {
        Frame::from_rows(self.columns, self.rows)
    }
}

/// A submitted query.
pub trait QueryJob {
    fn job_id(&self) -> &str;

    /// Block until the job finishes. Remote failures come back unchanged.
    fn wait(self) -> Result<ResultCursor>;
}

pub trait WarehouseClient {
    type Job: QueryJob;

    /// Fails with `Error::NotFound` when the table does not exist.
    fn get_table(&self, reference: &TableReference) -> Result<TableDescriptor>;

    /// Fails with `Error::NotFound` when the dataset does not exist.
    fn get_dataset(&self, reference: &DatasetReference) -> Result<DatasetReference>;

    fn list_datasets(&self, project: &str) -> Result<Vec<String>>;

    fn list_tables(&self, dataset: &DatasetReference) -> Result<Vec<String>>;

    /// Submit `statement` with its parameters, billed to `billing_project`.
    fn query(
        &self,
        statement: &str,
        parameters: &[BoundParameter],
        billing_project: &str,
    ) -> Result<Self::Job>;
}
