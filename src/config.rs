use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub translate_config: TranslateConfig,
    #[serde(default)]
    pub store_config: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "default_translate_url")]
    pub base_url: String,
    /// Resolved from `TRANSLATE_API_KEY`; the environment wins over any
    /// value in the file.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "memory" (dev/tests) or "firestore".
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default = "default_firestore_url")]
    pub base_url: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Resolved from `FIRESTORE_API_KEY`; the environment wins.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12480
}

fn default_translate_url() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_collection() -> String {
    "News".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        let path_lower = path.to_lowercase();
        let mut config: Config = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld")
        {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.resolve_secrets();
        Ok(config)
    }

    /// Credentials come from the environment, never from source; file values
    /// are a fallback for local setups.
    fn resolve_secrets(&mut self) {
        if let Ok(key) = std::env::var("TRANSLATE_API_KEY") {
            self.translate_config.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("FIRESTORE_API_KEY") {
            self.store_config.api_key = Some(key);
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            base_url: default_translate_url(),
            api_key: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            base_url: default_firestore_url(),
            project_id: None,
            database_id: default_database_id(),
            collection: default_collection(),
            api_key: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("system_config:\n  port: 9000\n").unwrap();
        assert_eq!(config.system_config.port, 9000);
        assert_eq!(config.store_config.backend, "memory");
        assert_eq!(config.store_config.collection, "News");
        assert_eq!(config.store_config.poll_interval_secs, 2);
        assert!(config
            .translate_config
            .base_url
            .starts_with("https://translation.googleapis.com"));
    }
}
