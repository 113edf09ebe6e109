//! Command-line and environment configuration.

use crate::server::ServerConfig;
use clap::Parser;
use thiserror::Error;

/// Settings read from the command line, falling back to the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "dinozoo")]
#[command(author, version, about = "GraphQL API for the zoo's dinosaur collection", long_about = None)]
pub struct Settings {
    /// Store connection string: mongodb://, mongodb+srv:// or memory://
    #[arg(long, env = "MONGO_URL")]
    pub mongo_url: Option<String>,

    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Database holding the collection
    #[arg(long = "database", env = "MONGO_DB", default_value = "zoo")]
    pub database: String,

    /// Collection holding the dinosaurs
    #[arg(long = "collection", env = "MONGO_COLLECTION", default_value = "dinosaur")]
    pub collection: String,

    /// Answer GET requests with 404 instead of the landing page
    #[arg(long)]
    pub no_landing_page: bool,
}

/// Configuration problems detected before serving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("MONGO_URL is not set")]
    MissingMongoUrl,
}

impl Settings {
    /// The store connection string. Missing and empty are both errors.
    pub fn mongo_url(&self) -> Result<&str, ConfigError> {
        self.mongo_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingMongoUrl)
    }

    pub fn server_config(&self) -> ServerConfig {
        let config = ServerConfig::new().host(&self.host).port(self.port);
        if self.no_landing_page {
            config.no_landing_page()
        } else {
            config
        }
    }
}
