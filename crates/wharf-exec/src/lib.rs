#![forbid(unsafe_code)]
//! wharf-exec: running parameterized statements against a warehouse.
//!
//! `expr`/`lineage` model the expression a statement was compiled from, which
//! is where query parameters get their names. `query` drives one statement
//! through binding, submission and result reshaping. `backend` is the
//! project/dataset-aware facade callers hold on to.

pub mod backend;
pub mod error;
pub mod expr;
pub mod lineage;
pub mod query;

pub use backend::{
    parse_project_and_dataset, ExecutionMode, PartitionColumn, Table, WarehouseBackend,
};
pub use error::{Error, Result};
pub use expr::{Expr, ScalarParameter};
pub use query::{Query, QueryState, Statement};
