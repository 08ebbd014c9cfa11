use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::search::SearchSessions;
use crate::store::{FirestoreClient, MemoryStore, NewsStore};
use crate::translate::{GoogleTranslateClient, TranslateInterface, TranslationHistory};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub translator: Arc<dyn TranslateInterface>,
    pub store: Arc<dyn NewsStore>,
    pub histories: Arc<DashMap<String, TranslationHistory>>,
    pub search_sessions: Arc<SearchSessions>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let api_key = config
            .translate_config
            .api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("TRANSLATE_API_KEY is not set"))?;

        let translator: Arc<dyn TranslateInterface> = Arc::new(GoogleTranslateClient::new(
            config.translate_config.base_url.clone(),
            api_key,
        ));

        let store = Self::create_store(&config)?;

        Ok(Self {
            config,
            translator,
            store,
            histories: Arc::new(DashMap::new()),
            search_sessions: Arc::new(SearchSessions::new()),
        })
    }

    /// Pick the store backend from configuration.
    fn create_store(config: &Config) -> anyhow::Result<Arc<dyn NewsStore>> {
        let store_config = &config.store_config;
        info!("Initializing news store backend: {}", store_config.backend);

        match store_config.backend.as_str() {
            "memory" => Ok(Arc::new(MemoryStore::new())),
            "firestore" => {
                let project_id = store_config
                    .project_id
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store_config.project_id is required"))?;
                let api_key = store_config
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("FIRESTORE_API_KEY is not set"))?;

                Ok(Arc::new(FirestoreClient::new(
                    store_config.base_url.clone(),
                    project_id,
                    &store_config.database_id,
                    store_config.collection.clone(),
                    api_key,
                    Duration::from_secs(store_config.poll_interval_secs),
                )))
            }
            other => Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }
    }

    pub fn generate_client_uid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
