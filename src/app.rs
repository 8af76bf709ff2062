use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{CatalogClient, CatalogHttpClient};
use crate::domain::THESES_CATALOG_NAME;
use crate::download::{Downloader, HttpDownloader, ensure_dir};
use crate::error::CatalogError;
use crate::table::{CatalogRow, CatalogTable, select};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub dataset_name: String,
    pub format: Option<String>,
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dataset_name: THESES_CATALOG_NAME.to_string(),
            format: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub dest_dir: String,
    pub dataset_name: String,
    pub format: Option<String>,
    pub dry_run: bool,
    pub matched: Vec<CatalogRow>,
    pub downloaded: Vec<DownloadedItem>,
    pub failures: Vec<FailedItem>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadedItem {
    pub dataset_name: String,
    pub url: String,
    pub format: String,
    pub path: String,
    pub downloaded_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub dataset_name: String,
    pub url: String,
    pub format: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Resolved { total: usize },
    Started { index: usize, url: String },
    Transferred {
        index: usize,
        received: u64,
        total: Option<u64>,
    },
    Completed {
        index: usize,
        url: String,
        path: String,
        elapsed: Duration,
    },
    Failed {
        index: usize,
        url: String,
        error: String,
    },
    Finished { downloaded: usize, failed: usize },
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: CatalogClient, D: Downloader> {
    catalog: C,
    downloader: D,
}

impl<C: CatalogClient, D: Downloader> App<C, D> {
    pub fn new(catalog: C, downloader: D) -> Self {
        Self {
            catalog,
            downloader,
        }
    }

    pub fn fetch_table(&self) -> Result<CatalogTable, CatalogError> {
        self.catalog.fetch_table()
    }

    pub fn run(
        &self,
        dest_dir: &Utf8Path,
        options: &BatchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BatchReport, CatalogError> {
        let table = self.catalog.fetch_table()?;
        let selected = select(&table, &options.dataset_name, options.format.as_deref());
        info!(
            listed = table.len(),
            matched = selected.len(),
            dataset = %options.dataset_name,
            "catalog filtered"
        );
        sink.event(ProgressEvent::Resolved {
            total: selected.len(),
        });

        let mut report = BatchReport {
            dest_dir: dest_dir.to_string(),
            dataset_name: options.dataset_name.clone(),
            format: options.format.clone(),
            dry_run: options.dry_run,
            matched: selected.rows().to_vec(),
            downloaded: Vec::new(),
            failures: Vec::new(),
        };
        if options.dry_run {
            return Ok(report);
        }

        ensure_dir(dest_dir)?;

        for (index, row) in selected.iter().enumerate() {
            sink.event(ProgressEvent::Started {
                index,
                url: row.resource_url.clone(),
            });
            let start = Instant::now();
            let on_bytes = |received, total| {
                sink.event(ProgressEvent::Transferred {
                    index,
                    received,
                    total,
                })
            };
            match self
                .downloader
                .download_with_progress(&row.resource_url, dest_dir, &on_bytes)
            {
                Ok(path) => {
                    sink.event(ProgressEvent::Completed {
                        index,
                        url: row.resource_url.clone(),
                        path: path.to_string(),
                        elapsed: start.elapsed(),
                    });
                    report.downloaded.push(downloaded_item(row, &path));
                }
                Err(err) => {
                    warn!(url = %row.resource_url, error = %err, "download failed, continuing");
                    sink.event(ProgressEvent::Failed {
                        index,
                        url: row.resource_url.clone(),
                        error: err.to_string(),
                    });
                    report.failures.push(FailedItem {
                        dataset_name: row.dataset_name.clone(),
                        url: row.resource_url.clone(),
                        format: row.resource_format.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        sink.event(ProgressEvent::Finished {
            downloaded: report.downloaded.len(),
            failed: report.failures.len(),
        });
        info!(
            downloaded = report.downloaded.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        Ok(report)
    }
}

pub fn run(dest_dir: &Utf8Path) -> Result<BatchReport, CatalogError> {
    let app = App::new(CatalogHttpClient::new()?, HttpDownloader::new()?);
    app.run(dest_dir, &BatchOptions::default(), &NoopSink)
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

fn downloaded_item(row: &CatalogRow, path: &Utf8Path) -> DownloadedItem {
    DownloadedItem {
        dataset_name: row.dataset_name.clone(),
        url: row.resource_url.clone(),
        format: row.resource_format.clone(),
        path: path.to_string(),
        downloaded_at: chrono::Utc::now().to_rfc3339(),
    }
}
