use std::sync::Arc;

use tracing::info;

use super::{
    config::Config,
    database::{ListService, RedisList, init_redis},
    entry::EntryStore,
    error::AppError,
};

pub struct State {
    pub config: Config,
    pub entries: EntryStore,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        info!("Connecting to Redis at {}:{}", config.redis_host, config.redis_port);
        let redis_connection = init_redis(config.connection_info()).await?;

        Ok(Self::with_list(config, Arc::new(RedisList::new(redis_connection))))
    }

    /// State over any list service, the Redis connection is not touched.
    pub fn with_list(config: Config, list: Arc<dyn ListService>) -> Arc<Self> {
        let entries = EntryStore::new(list, config.entries_key.clone());

        Arc::new(Self { config, entries })
    }
}
