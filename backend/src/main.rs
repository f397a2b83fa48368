//! Service entry-point: loads settings, picks the record store and serves the
//! GraphQL endpoint.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use feedgraph::domain::ports::RecordStore;
use feedgraph::inbound::http::health::HealthState;
use feedgraph::outbound::memory::{Dataset, InMemoryRecordStore};
use feedgraph::outbound::persistence::{DbPool, DieselRecordStore};
use feedgraph::settings::{ServerSettings, StoreSource};
use server::{ServerConfig, create_server};

async fn build_store(settings: &ServerSettings) -> io::Result<Arc<dyn RecordStore>> {
    match settings.store_source() {
        StoreSource::Database(config) => {
            let max_size = config.max_size();
            let pool = DbPool::new(config)
                .await
                .map_err(|err| io::Error::other(format!("database pool: {err}")))?;
            info!(max_size, "serving records from PostgreSQL");
            Ok(Arc::new(DieselRecordStore::new(pool)))
        }
        StoreSource::Seed(path) => {
            let dataset = Dataset::load(&path).map_err(io::Error::other)?;
            let store = InMemoryRecordStore::try_from(dataset).map_err(io::Error::other)?;
            info!(
                path = %path.display(),
                records = store.len(),
                "serving records from seed file"
            );
            Ok(Arc::new(store))
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|err| io::Error::other(format!("failed to load settings: {err}")))?;
    let bind_addr = settings.bind_address().map_err(io::Error::other)?;
    let store = build_store(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(bind_addr, store);
    info!(bind_addr = %config.bind_addr(), "listening");
    create_server(health_state, config)?.await
}
