#![forbid(unsafe_code)]
//! wharf-warehouse: everything on the warehouse side of the boundary.
//!
//! - `descriptor`: table/column descriptors in the warehouse's REST shape.
//! - `import`: descriptor → `DataType`/`Schema`, including partition columns.
//! - `client`: the `WarehouseClient` trait the adapter talks through.
//! - `memory`: an in-memory client for tests and offline use.

pub mod client;
pub mod descriptor;
pub mod error;
pub mod import;
pub mod memory;

pub use client::{QueryJob, ResultCursor, WarehouseClient};
pub use descriptor::{
    DatasetReference, FieldDescriptor, FieldMode, TableDescriptor, TableReference,
    TimePartitioning,
};
pub use error::{Error, Result};
pub use import::{import_table_schema, import_type, partition_column, NATIVE_PARTITION_COLUMN};
pub use memory::{MemoryJob, MemoryWarehouse, Submission};
