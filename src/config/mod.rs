use crate::error::Result;
use config::Environment;
use serde::Deserialize;

/// Runtime configuration, read from `APP_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// PostgreSQL connection string. When unset the service runs on an
    /// in-memory catalog.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Allowed CORS origin. Any origin is accepted when unset.
    pub frontend_url: Option<String>,
    /// JSON feed used by `POST /api/books/sync`.
    pub sync_source_url: Option<String>,
    /// Root of the `@id`/`url` values in JSON-LD documents.
    pub catalog_base_url: String,
}

impl Config {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_env_prefix("APP")
    }

    pub fn from_env_prefix(prefix: &str) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3001)?
            .set_default("database_max_connections", 20)?
            .set_default("catalog_base_url", "http://localhost:3001/books")?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
