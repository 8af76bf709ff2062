use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::app::BatchOptions;
use crate::catalog::{
    CatalogSettings, DEFAULT_API_BASE, DEFAULT_QUERY, DEFAULT_ROWS, DEFAULT_TIMEOUT,
};
use crate::domain::THESES_CATALOG_NAME;
use crate::error::CatalogError;
use crate::retry::{RetryPolicy, RetrySettings};

pub const DEFAULT_CONFIG_FILE: &str = "catalogos-capes.json";
pub const DEFAULT_DEST_DIR: &str = "./data";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub dataset_name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub dest_dir: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub catalog: CatalogSettings,
    pub retry: RetryPolicy,
    pub dataset_name: String,
    pub format: Option<String>,
    pub dest_dir: Utf8PathBuf,
}

impl ResolvedConfig {
    pub fn batch_options(&self, dry_run: bool) -> BatchOptions {
        BatchOptions {
            dataset_name: self.dataset_name.clone(),
            format: self.format.clone(),
            dry_run,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        // An empty config resolves to every default.
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(CatalogError::MissingConfig(config_path));
            }
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let catalog = CatalogSettings {
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            query: config.query.unwrap_or_else(|| DEFAULT_QUERY.to_string()),
            rows: config.rows.unwrap_or(DEFAULT_ROWS),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        ResolvedConfig {
            catalog,
            retry: RetryPolicy::from(&config.retry),
            dataset_name: config
                .dataset_name
                .unwrap_or_else(|| THESES_CATALOG_NAME.to_string()),
            format: config.format.filter(|format| !format.trim().is_empty()),
            dest_dir: Utf8PathBuf::from(config.dest_dir.as_deref().unwrap_or(DEFAULT_DEST_DIR)),
        }
    }
}
