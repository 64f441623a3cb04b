use std::sync::Arc;

use crate::{config::Config, database::ForumDatabase, service::ForumService};

/// Process-scoped context. Built once in `main`; no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub service: ForumService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database and install the schema
        let database = ForumDatabase::new(&config.database.url).await?;
        database.init().await?;
        let database = Arc::new(database);

        let service = ForumService::new(database);

        Ok(Self { service, config })
    }
}
