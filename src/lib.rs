pub mod app;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod output;
pub mod progress;
pub mod retry;
pub mod table;

pub use app::{App, BatchOptions, BatchReport, run};
pub use catalog::{CatalogClient, CatalogHttpClient};
pub use download::{Downloader, HttpDownloader};
pub use error::CatalogError;
pub use table::{CatalogTable, flatten, select};
