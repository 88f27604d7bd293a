use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app::error::{Result, StripError};
use crate::collector::Collector;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: SqliteStore,
    pub http: Arc<HttpFetcher>,
    pub collector: Collector,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        Self::with_store(config, SqliteStore::new(&db_path)?)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, SqliteStore::in_memory()?)
    }

    fn with_store(config: Config, store: SqliteStore) -> Result<Self> {
        let http = Arc::new(HttpFetcher::new(&config.http)?);
        let source_timeout = match config.collector.source_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let collector = Collector::with_timeout(http.clone(), source_timeout);

        Ok(Self {
            config,
            store,
            http,
            collector,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StripError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("stripfeed");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("stripfeed.db"))
    }
}
