//! Server errors.

use crate::config::ConfigError;
use dinozoo_runtime::SchemaError;
use dinozoo_store::StoreError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("a schema is required")]
    MissingSchema,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid listen address \"{address}\"")]
    InvalidAddress { address: String },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
