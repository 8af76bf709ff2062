use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info};

use crate::domain::{DatasetDescriptor, parse_package_search};
use crate::error::CatalogError;
use crate::table::{CatalogTable, flatten};

pub const DEFAULT_API_BASE: &str = "https://dadosabertos.capes.gov.br/api/3/action";
pub const DEFAULT_QUERY: &str = "catalogo-de-teses-e-dissertacoes";
pub const DEFAULT_ROWS: u32 = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub trait CatalogClient {
    fn fetch_all(&self) -> Result<Vec<DatasetDescriptor>, CatalogError>;

    fn fetch_table(&self) -> Result<CatalogTable, CatalogError> {
        let datasets = self.fetch_all()?;
        Ok(flatten(&datasets))
    }
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_base: String,
    pub query: String,
    pub rows: u32,
    pub timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            query: DEFAULT_QUERY.to_string(),
            rows: DEFAULT_ROWS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    settings: CatalogSettings,
}

impl CatalogHttpClient {
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_settings(CatalogSettings::default())
    }

    pub fn with_settings(settings: CatalogSettings) -> Result<Self, CatalogError> {
        let client = build_client(settings.timeout)?;
        Ok(Self { client, settings })
    }

    pub fn search_url(&self) -> String {
        format!(
            "{}/package_search",
            self.settings.api_base.trim_end_matches('/')
        )
    }
}

impl CatalogClient for CatalogHttpClient {
    fn fetch_all(&self) -> Result<Vec<DatasetDescriptor>, CatalogError> {
        let url = self.search_url();
        let rows = self.settings.rows.to_string();
        debug!(%url, query = %self.settings.query, rows = self.settings.rows, "listing catalog");

        let response = self
            .client
            .get(&url)
            .query(&[("q", self.settings.query.as_str()), ("rows", rows.as_str())])
            .send()
            .map_err(|err| CatalogError::CatalogHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "catalog request failed".to_string());
            return Err(CatalogError::CatalogStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| CatalogError::CatalogHttp(err.to_string()))?;
        let datasets = parse_package_search(&body)?;
        info!(datasets = datasets.len(), "catalog listed");
        Ok(datasets)
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, CatalogError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("catalogos-capes/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| CatalogError::CatalogHttp(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| CatalogError::CatalogHttp(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_tolerates_trailing_slash() {
        let client = CatalogHttpClient::with_settings(CatalogSettings {
            api_base: "http://portal.test/api/3/action/".to_string(),
            ..CatalogSettings::default()
        })
        .unwrap();
        assert_eq!(
            client.search_url(),
            "http://portal.test/api/3/action/package_search"
        );
    }
}
