use std::fmt;
use std::path::PathBuf;

/// Result of a single download request. Downloaders never bubble client
/// errors up; they end in one of these states instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Finished; lists the files this tool wrote itself (may be empty when the
    /// extractor picked the names).
    Finished(Vec<PathBuf>),
    /// Target already existed, nothing was written.
    Skipped(PathBuf),
    /// Finished, but the tool reported that some items could not be fetched.
    Partial(String),
    Failed(String),
}

impl DownloadOutcome {
    pub fn failed(err: impl fmt::Display) -> Self {
        DownloadOutcome::Failed(err.to_string())
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, DownloadOutcome::Finished(_))
    }

    /// Console line for this outcome, prefixed with the usual marker.
    pub fn status_line(&self, label: &str) -> String {
        match self {
            DownloadOutcome::Finished(_) => format!("✅ {label} download finished!"),
            DownloadOutcome::Skipped(path) => {
                format!("⚠️ Skipping duplicate: {}", path.display())
            }
            DownloadOutcome::Partial(message) => {
                format!("⚠️ {label} download finished with errors: {message}")
            }
            DownloadOutcome::Failed(message) => format!("❌ Failed: {message}"),
        }
    }

    /// Prints [`Self::status_line`] and hands the outcome back.
    pub fn report(self, label: &str) -> Self {
        println!("{}", self.status_line(label));
        match &self {
            DownloadOutcome::Failed(message) => {
                tracing::warn!("{label} download failed: {message}")
            }
            DownloadOutcome::Partial(message) => {
                tracing::warn!("{label} download incomplete: {message}")
            }
            _ => {}
        }
        self
    }
}
