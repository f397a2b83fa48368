//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `FEEDGRAPH_*` environment variables and
//! configuration files, in that order of precedence.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

fn default_seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("seed.json")
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("bind address \"{value}\" is not a socket address")]
    InvalidBindAddress { value: String },
}

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// PostgreSQL through the Diesel adapter.
    Database(PoolConfig),
    /// A JSON dataset loaded into memory.
    Seed(PathBuf),
}

/// Configuration values for the HTTP service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FEEDGRAPH")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_address: Option<String>,
    /// PostgreSQL connection string. Takes precedence over the seed file.
    pub database_url: Option<String>,
    /// JSON dataset served when no database is configured.
    pub seed_path: Option<PathBuf>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_size: u32,
}

impl ServerSettings {
    /// Return the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_address(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS);
        value
            .parse()
            .map_err(|_| SettingsError::InvalidBindAddress {
                value: value.to_owned(),
            })
    }

    /// Return the configured seed path, falling back to the bundled dataset.
    pub fn seed_path(&self) -> PathBuf {
        self.seed_path.clone().unwrap_or_else(default_seed_path)
    }

    /// Decide which record store backs the service.
    pub fn store_source(&self) -> StoreSource {
        match &self.database_url {
            Some(url) => {
                StoreSource::Database(PoolConfig::new(url.clone()).with_max_size(self.pool_size))
            }
            None => StoreSource::Seed(self.seed_path()),
        }
    }
}
