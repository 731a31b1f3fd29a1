//! On-disk layout for downloaded media.
//!
//! Everything lands under `<root>/<platform>/<channel>/<content-type>/`. The
//! root comes from [`crate::config::Settings`]; nothing is created until a
//! downloader actually asks for a folder.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHANNEL: &str = "Unknown";
pub const DEFAULT_CONTENT_TYPE: &str = "All";

/// Builds output folders below a fixed download root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<platform>/<channel>/<content_type>` without touching the disk.
    ///
    /// Names are not validated. yt-dlp style tokens such as `%(uploader)s`
    /// are passed through untouched so the extractor can expand them.
    pub fn folder_path(&self, platform: &str, channel: &str, content_type: &str) -> PathBuf {
        self.root.join(platform).join(channel).join(content_type)
    }

    /// Returns the folder for the triple and makes sure it exists. Calling it
    /// twice is fine.
    pub fn folder(&self, platform: &str, channel: &str, content_type: &str) -> Result<PathBuf> {
        let folder = self.folder_path(platform, channel, content_type);
        fs::create_dir_all(&folder).with_context(|| format!("creating {}", folder.display()))?;
        Ok(folder)
    }

    /// Folder with the default channel and content type.
    pub fn platform_folder(&self, platform: &str) -> Result<PathBuf> {
        self.folder(platform, DEFAULT_CHANNEL, DEFAULT_CONTENT_TYPE)
    }
}

/// True when something already sits at `path`, meaning the write should be
/// skipped.
pub fn is_duplicate(path: &Path) -> bool {
    path.exists()
}
