use thiserror::Error;

use crate::query::QueryState;

/// Result type local to wharf-exec.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Parameter {0} does not appear in the query expression")]
    UnboundParameter(String),

    #[error("Query cannot execute from state {0:?}")]
    InvalidState(QueryState),

    #[error("Invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error(transparent)]
    Core(#[from] wharf_core::Error),

    #[error(transparent)]
    Params(#[from] wharf_params::Error),

    #[error(transparent)]
    Warehouse(#[from] wharf_warehouse::Error),
}
