use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::clients::repo::{ClientStore, PgClientStore};
use crate::clients::services::ClientService;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub clients: ClientService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }

        Ok(Self::with_store(Arc::new(PgClientStore::new(db))))
    }

    pub fn with_store(store: Arc<dyn ClientStore>) -> Self {
        Self {
            clients: ClientService::new(store),
        }
    }
}
