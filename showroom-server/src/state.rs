//! Application state for showroom-server

use std::sync::Arc;

use crate::config::{Config, LiveConfig};
use crate::db::{BoxError, MemoryStore, PgStore, Store};
use crate::hub::Hub;
use crate::services::Services;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (PostgreSQL, or in-memory in development)
    pub store: Arc<dyn Store>,
    /// Per-dealership live connection registry
    pub hub: Hub,
    /// Domain services wired to `store` and `hub`
    pub services: Services,
    /// Live connection timings and limits
    pub live: LiveConfig,
}

impl AppState {
    /// Connect the configured store and wire the services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                tracing::info!("Connected to PostgreSQL, migrations applied");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(store, config.live.clone()))
    }

    pub fn with_store(store: Arc<dyn Store>, live: LiveConfig) -> Self {
        let hub = Hub::new(live.queue_capacity);
        let services = Services::new(store.clone(), hub.clone());
        Self {
            store,
            hub,
            services,
            live,
        }
    }
}
