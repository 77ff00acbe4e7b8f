//! Shared application state for the web server.

use std::sync::Arc;

use yieldpilot_config::Config;
use yieldpilot_db::{MemoryStore, PgStore};
use yieldpilot_ranker::RankerService;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub ranker: RankerService,
}

impl AppState {
    pub fn new(ranker: RankerService) -> Self {
        Self { ranker }
    }

    /// Connect to Postgres when a database URL is configured, otherwise fall
    /// back to an empty in-process store.
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let ranker = match cfg.database.url.as_deref() {
            Some(url) => {
                let store = PgStore::connect(url, cfg.database.max_connections).await?;
                store.ensure_schema().await?;
                tracing::info!(max_connections = cfg.database.max_connections, "Connected to Postgres");
                RankerService::from_store(Arc::new(store), &cfg.ranker)
            }
            None => {
                tracing::warn!("No database URL configured; using in-memory store");
                RankerService::from_store(Arc::new(MemoryStore::new()), &cfg.ranker)
            }
        };
        Ok(Self::new(ranker))
    }
}

pub type SharedState = Arc<AppState>;
