//! Batch mode: a text file with one URL per line, processed in order.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::outcome::DownloadOutcome;
use crate::platform::{Platform, classify};

/// Receives every recognized URL from a batch run.
pub trait Dispatch {
    fn dispatch(&mut self, platform: Platform, url: &str) -> DownloadOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedUrl {
    pub platform: Platform,
    pub url: String,
    pub outcome: DownloadOutcome,
}

/// What a batch run did, in file order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub dispatched: Vec<DispatchedUrl>,
    pub unsupported: Vec<String>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.dispatched
            .iter()
            .filter(|entry| matches!(entry.outcome, DownloadOutcome::Failed(_)))
            .count()
    }
}

/// Non-empty, trimmed lines of `contents`.
pub fn parse_urls(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Reads `path` and hands each URL to `dispatcher`. Only an unreadable file
/// is an error; per-URL failures are recorded in the report and the run goes
/// on.
pub fn run_batch(path: &Path, dispatcher: &mut impl Dispatch) -> Result<BatchReport> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let urls = parse_urls(&contents);
    tracing::info!("batch {} holds {} urls", path.display(), urls.len());

    let mut report = BatchReport::default();
    for url in urls {
        match classify(url).platform() {
            Some(platform) => {
                let outcome = dispatcher.dispatch(platform, url);
                report.dispatched.push(DispatchedUrl {
                    platform,
                    url: url.to_owned(),
                    outcome,
                });
            }
            None => {
                println!("❌ Unsupported URL: {url}");
                report.unsupported.push(url.to_owned());
            }
        }
    }
    Ok(report)
}
