use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::catalog::{DEFAULT_TIMEOUT, build_client};
use crate::error::CatalogError;
use crate::retry::{AttemptError, RetryPolicy};

const CHUNK_SIZE: usize = 1_000_000;

pub trait Downloader {
    fn download(&self, url: &str, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, CatalogError>;

    /// Like `download`, calling `on_bytes(received, content_length)` as chunks arrive.
    fn download_with_progress(
        &self,
        url: &str,
        dest_dir: &Utf8Path,
        _on_bytes: &dyn Fn(u64, Option<u64>),
    ) -> Result<Utf8PathBuf, CatalogError> {
        self.download(url, dest_dir)
    }
}

#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
    policy: RetryPolicy,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_policy(RetryPolicy::default(), DEFAULT_TIMEOUT)
    }

    pub fn with_policy(policy: RetryPolicy, timeout: Duration) -> Result<Self, CatalogError> {
        let client = build_client(timeout)?;
        Ok(Self { client, policy })
    }

    fn attempt(
        &self,
        url: &Url,
        dest_dir: &Utf8Path,
        target: &Utf8Path,
        on_bytes: &dyn Fn(u64, Option<u64>),
    ) -> Result<u64, AttemptError<Failure>> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(classify_request_error)?;
        let status = response.status();
        if !status.is_success() {
            let failure = Failure::Status(status.as_u16());
            return Err(if is_retryable_status(status.as_u16()) {
                AttemptError::Transient(failure)
            } else {
                AttemptError::Permanent(failure)
            });
        }
        let total = response.content_length();
        debug!(%url, bytes = ?total, "streaming response");

        let mut temp = tempfile::Builder::new()
            .prefix(".catalogos-capes")
            .suffix(".part")
            .tempfile_in(dest_dir.as_std_path())
            .map_err(|err| AttemptError::Permanent(Failure::Filesystem(err.to_string())))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| AttemptError::Transient(Failure::Body(err)))?;
            if read == 0 {
                break;
            }
            temp.write_all(&buffer[..read])
                .map_err(|err| AttemptError::Permanent(Failure::Filesystem(err.to_string())))?;
            written += read as u64;
            on_bytes(written, total);
        }
        temp.flush()
            .map_err(|err| AttemptError::Permanent(Failure::Filesystem(err.to_string())))?;

        temp.persist(target.as_std_path())
            .map_err(|err| AttemptError::Permanent(Failure::Filesystem(err.to_string())))?;
        Ok(written)
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest_dir: &Utf8Path) -> Result<Utf8PathBuf, CatalogError> {
        self.download_with_progress(url, dest_dir, &|_, _| {})
    }

    fn download_with_progress(
        &self,
        url: &str,
        dest_dir: &Utf8Path,
        on_bytes: &dyn Fn(u64, Option<u64>),
    ) -> Result<Utf8PathBuf, CatalogError> {
        let parsed =
            Url::parse(url).map_err(|err| CatalogError::InvalidUrl(format!("{url}: {err}")))?;
        let file_name = file_name_from_url(&parsed)
            .ok_or_else(|| CatalogError::InvalidUrl(format!("{url}: no file name in path")))?;
        ensure_dir(dest_dir)?;
        let target = dest_dir.join(&file_name);

        let written = self
            .policy
            .run(|attempt| {
                debug!(%url, attempt, "download attempt");
                self.attempt(&parsed, dest_dir, &target, on_bytes)
            })
            .map_err(|failure| match failure.error {
                Failure::Filesystem(message) => CatalogError::Filesystem(message),
                other => CatalogError::Download {
                    url: url.to_string(),
                    attempts: failure.attempts,
                    cause: other.to_string(),
                },
            })?;

        info!(%url, path = %target, bytes = written, "downloaded");
        Ok(target)
    }
}

pub fn ensure_dir(dir: &Utf8Path) -> Result<(), CatalogError> {
    fs::create_dir_all(dir.as_std_path())
        .map_err(|err| CatalogError::Filesystem(format!("create {dir}: {err}")))
}

pub fn file_name_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

#[derive(Debug)]
enum Failure {
    Status(u16),
    Request(reqwest::Error),
    Body(io::Error),
    Filesystem(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Status(status) => write!(f, "HTTP status {status}"),
            Failure::Request(err) => write!(f, "{err}"),
            Failure::Body(err) => write!(f, "reading response body: {err}"),
            Failure::Filesystem(message) => write!(f, "{message}"),
        }
    }
}

fn classify_request_error(err: reqwest::Error) -> AttemptError<Failure> {
    if is_retryable_error(&err) {
        AttemptError::Transient(Failure::Request(err))
    } else {
        AttemptError::Permanent(Failure::Request(err))
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        let url = Url::parse(
            "https://dadosabertos.capes.gov.br/dataset/x/download/br-capes-2021.xlsx?v=2",
        )
        .unwrap();
        assert_eq!(
            file_name_from_url(&url).as_deref(),
            Some("br-capes-2021.xlsx")
        );
    }

    #[test]
    fn trailing_slash_has_no_file_name() {
        let url = Url::parse("http://x/files/").unwrap();
        assert_eq!(file_name_from_url(&url), None);
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
    }
}
