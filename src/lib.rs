#![forbid(unsafe_code)]
//! wharf: a warehouse adapter that reconciles expression types, warehouse
//! column types, and in-memory result columns.
//!
//! This crate only re-exports the workspace members.

pub use wharf_core;
pub use wharf_exec;
pub use wharf_params;
pub use wharf_warehouse;
