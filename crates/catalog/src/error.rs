use thiserror::Error;

/// Errors that can occur when interacting with the part store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
