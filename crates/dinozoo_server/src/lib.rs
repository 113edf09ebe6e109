//! GraphQL server for the dinozoo dinosaur collection.
//!
//! This crate provides:
//! - `config`: Command-line and environment settings
//! - `server`: Server builder and the parse/validate/execute pipeline
//! - `resolvers`: Root field resolvers over a `DinosaurStore`
//! - `http`: hyper transport and routing
//! - `error`: Startup errors

pub mod config;
pub mod error;
pub mod http;
pub mod resolvers;
pub mod server;

pub use config::{ConfigError, Settings};
pub use error::{ServerError, ServerResult};
pub use resolvers::{DinosaurResolvers, SCHEMA_SDL};
pub use server::{DinozooServer, ServerBuilder, ServerConfig};

use dinozoo_store::DinosaurStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Builds the server for the dinosaur schema over `store`.
pub fn build_server(
    config: ServerConfig,
    store: Arc<dyn DinosaurStore>,
) -> ServerResult<DinozooServer> {
    DinozooServer::builder()
        .config(config)
        .schema_sdl(SCHEMA_SDL)
        .resolvers(DinosaurResolvers::new(store).into_resolver_map())
        .build()
}

/// Connects the store, binds the listener and serves until Ctrl-C.
pub async fn run(settings: Settings) -> ServerResult<()> {
    let url = settings.mongo_url()?;
    let store = dinozoo_store::connect(url, &settings.database, &settings.collection).await?;
    info!(backend = store.backend(), "store ready");

    let server = Arc::new(build_server(settings.server_config(), store)?);

    let address = server.config().address();
    let address: SocketAddr = address
        .parse()
        .map_err(|_| ServerError::InvalidAddress { address })?;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind { address, source })?;

    info!("listening on http://{address}/graphql");
    http::serve(listener, server, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
