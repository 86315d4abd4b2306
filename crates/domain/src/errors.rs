//! Domain error types.

use shared::pagination::PaginationError;
use thiserror::Error;

/// Failure of an entry store operation (I/O, constraint, connectivity).
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct StoreError {
    /// Name of the store operation, e.g. `append`.
    pub operation: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl StoreError {
    pub fn new(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// Errors surfaced by the scheduled configuration service.
#[derive(Debug, Error)]
pub enum ScheduledConfigError {
    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] validator::ValidationErrors),

    #[error("Identifiers are assigned by the store and must not be supplied")]
    IdentifierSupplied,

    #[error("Invalid page request: {0}")]
    InvalidPage(#[from] PaginationError),

    #[error("Invalid sort order: {0}")]
    InvalidSort(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
