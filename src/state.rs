use crate::config::AppConfig;
use crate::db;
use crate::users::{
    memory::InMemoryUserStore,
    repo::{PgUserStore, UserStore},
    services::UserDirectory,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: UserDirectory,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(&config, url).await?;
                tracing::info!("using postgres user store");
                Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory only");
                Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        Self {
            config,
            directory: UserDirectory::new(store),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(config, Arc::new(InMemoryUserStore::new()))
    }
}
