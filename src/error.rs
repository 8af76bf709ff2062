use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("missing config file at {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("catalog returned status {status}: {message}")]
    CatalogStatus { status: u16, message: String },

    #[error("failed to parse catalog response: {0}")]
    CatalogParse(String),

    #[error("invalid catalog entry: {0}")]
    #[diagnostic(help("the portal returned a dataset or resource without its required fields"))]
    Validation(String),

    #[error("invalid resource url: {0}")]
    InvalidUrl(String),

    #[error("download of {url} failed after {attempts} attempt(s): {cause}")]
    Download {
        url: String,
        attempts: u32,
        cause: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl CatalogError {
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            CatalogError::CatalogHttp(_)
                | CatalogError::CatalogStatus { .. }
                | CatalogError::CatalogParse(_)
                | CatalogError::Validation(_)
        )
    }
}
