//! Store errors.

use thiserror::Error;

/// Errors raised by a dinosaur store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("stored document has no _id")]
    MissingIdentifier,

    #[error("database did not return an ObjectId for the inserted document")]
    UnexpectedInsertId,

    #[error("unsupported store url scheme \"{0}\" (expected mongodb://, mongodb+srv:// or memory://)")]
    UnsupportedScheme(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
