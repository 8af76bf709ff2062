use std::time::Duration;

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use crate::app::{ProgressEvent, ProgressSink};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {prefix} {msg}";

pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Resolved { total } => {
                self.bar.set_length(total as u64);
                self.bar.set_message("downloading datasets");
            }
            ProgressEvent::Started { url, .. } => {
                self.bar.set_prefix(short_name(&url).to_string());
                self.bar.set_message("");
            }
            ProgressEvent::Transferred {
                received, total, ..
            } => self.bar.set_message(transfer_message(received, total)),
            ProgressEvent::Completed { .. } => self.bar.inc(1),
            ProgressEvent::Failed { url, error, .. } => {
                self.bar.println(format!("failed: {url}: {error}"));
                self.bar.inc(1);
            }
            ProgressEvent::Finished { downloaded, failed } => {
                self.bar.set_prefix("");
                self.bar
                    .finish_with_message(format!("{downloaded} downloaded, {failed} failed"));
            }
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

fn transfer_message(received: u64, total: Option<u64>) -> String {
    match total {
        Some(total) => format!("{}/{}", HumanBytes(received), HumanBytes(total)),
        None => HumanBytes(received).to_string(),
    }
}

fn short_name(url: &str) -> &str {
    url.rsplit('/').find(|part| !part.is_empty()).unwrap_or(url)
}
