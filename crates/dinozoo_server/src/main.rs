//! Dinozoo server.
//!
//! # Running
//! ```bash
//! MONGO_URL=mongodb://localhost:27017 cargo run --release
//! ```

use clap::Parser;
use dinozoo_server::Settings;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dinozoo=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::parse();
    match dinozoo_server::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
