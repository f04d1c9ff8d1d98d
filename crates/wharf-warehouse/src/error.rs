use thiserror::Error;

/// Result type local to wharf-warehouse.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The dataset or table does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other failure reported by the warehouse.
    #[error("Warehouse error: {0}")]
    Remote(String),

    #[error("RECORD field '{0}' declares no child fields")]
    EmptyRecord(String),

    #[error(transparent)]
    Core(#[from] wharf_core::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
