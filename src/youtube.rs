//! YouTube downloads, delegated entirely to yt-dlp.
//!
//! This module only decides *what* to ask for: format selector, output
//! template, playlist cap and the side files (subtitles, thumbnail). Fetching,
//! retries and muxing to mp4 are yt-dlp's job.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::layout::OutputLayout;
use crate::outcome::DownloadOutcome;
use crate::platform::Platform;
use crate::process::run_status;

/// yt-dlp token expanded to the uploader name at download time.
const UPLOADER_TOKEN: &str = "%(uploader)s";
const TITLE_TEMPLATE: &str = "%(title)s.%(ext)s";
const SHORTS_FOLDER: &str = "Shorts";
const FULL_VIDEOS_FOLDER: &str = "Full_Videos";

/// Requested video quality: either whatever yt-dlp thinks is best, or a cap
/// on the vertical resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    MaxHeight(u32),
}

impl FromStr for Quality {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim().trim_end_matches(['p', 'P']);
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("best") {
            return Ok(Quality::Best);
        }
        match trimmed.parse::<u32>() {
            Ok(height) if height > 0 => Ok(Quality::MaxHeight(height)),
            _ => bail!("invalid quality '{}': use best or a height like 720", value.trim()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadKind {
    Shorts,
    Full,
    #[default]
    All,
}

impl FromStr for DownloadKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(DownloadKind::All),
            "shorts" | "short" => Ok(DownloadKind::Shorts),
            "full" => Ok(DownloadKind::Full),
            other => bail!("invalid download type '{other}': use shorts, full or all"),
        }
    }
}

/// Everything the prompt collects for a YouTube request.
#[derive(Debug, Clone, Default)]
pub struct YoutubeOptions {
    pub quality: Quality,
    pub max_items: Option<u32>,
    pub kind: DownloadKind,
    pub trending_shorts: bool,
    pub audio_only: bool,
}

impl YoutubeOptions {
    /// Shorts go into their own folder, everything else is filed as full
    /// videos (including `all`).
    pub fn folder_label(&self) -> &'static str {
        if self.kind == DownloadKind::Shorts || self.trending_shorts {
            SHORTS_FOLDER
        } else {
            FULL_VIDEOS_FOLDER
        }
    }

    pub fn format_selector(&self) -> String {
        if self.audio_only {
            return "bestaudio/best".to_owned();
        }
        match self.quality {
            Quality::Best => "best".to_owned(),
            Quality::MaxHeight(height) => format!("bestvideo[height<={height}]+bestaudio/best"),
        }
    }
}

/// Output template handed to `--output`.
pub fn output_template(layout: &OutputLayout, options: &YoutubeOptions) -> PathBuf {
    layout
        .folder_path(
            Platform::YouTube.folder_name(),
            UPLOADER_TOKEN,
            options.folder_label(),
        )
        .join(TITLE_TEMPLATE)
}

/// Full yt-dlp argument vector for `url`.
pub fn build_args(url: &str, template: &Path, options: &YoutubeOptions) -> Vec<String> {
    let mut args = vec![
        "--format".to_owned(),
        options.format_selector(),
        "--output".to_owned(),
        template.to_string_lossy().into_owned(),
        "--yes-playlist".to_owned(),
    ];
    if let Some(max) = options.max_items {
        args.push("--playlist-end".to_owned());
        args.push(max.to_string());
    }
    args.extend(
        [
            "--write-subs",
            "--write-auto-subs",
            "--write-thumbnail",
            "--merge-output-format",
            "mp4",
            "--ignore-errors",
            "--continue",
        ]
        .map(str::to_owned),
    );
    // Keeps URLs starting with '-' from being read as options.
    args.push("--".to_owned());
    args.push(url.to_owned());
    args
}

#[derive(Debug, Clone)]
pub struct YoutubeDownloader {
    ytdlp: PathBuf,
    layout: OutputLayout,
}

impl YoutubeDownloader {
    pub fn new(ytdlp: impl Into<PathBuf>, layout: OutputLayout) -> Self {
        Self {
            ytdlp: ytdlp.into(),
            layout,
        }
    }

    /// Downloads a video, playlist or channel. Never returns an error; the
    /// outcome is printed and handed back.
    pub fn download(&self, url: &str, options: &YoutubeOptions) -> DownloadOutcome {
        let outcome = match self.try_download(url, options) {
            Ok(outcome) => outcome,
            Err(err) => DownloadOutcome::failed(format!("{err:#}")),
        };
        outcome.report("YouTube")
    }

    fn try_download(&self, url: &str, options: &YoutubeOptions) -> Result<DownloadOutcome> {
        // Only the platform level can exist up front; yt-dlp expands the
        // uploader token and creates the rest.
        let platform_dir = self.layout.root().join(Platform::YouTube.folder_name());
        fs::create_dir_all(&platform_dir)
            .with_context(|| format!("creating {}", platform_dir.display()))?;

        let template = output_template(&self.layout, options);
        let args = build_args(url, &template, options);
        tracing::info!("downloading {url} from YouTube");
        let status = run_status(&self.ytdlp, &args)?;
        match status.code() {
            Some(0) => Ok(DownloadOutcome::Finished(Vec::new())),
            // --ignore-errors: exit 1 means some entries failed, the rest were fetched.
            Some(1) => Ok(DownloadOutcome::Partial(
                "yt-dlp could not fetch some items".to_owned(),
            )),
            _ => bail!("yt-dlp exited with status {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::install_stub;
    use tempfile::tempdir;

    #[test]
    fn quality_parses_heights_and_best() {
        assert_eq!("best".parse::<Quality>().unwrap(), Quality::Best);
        assert_eq!("".parse::<Quality>().unwrap(), Quality::Best);
        assert_eq!("720".parse::<Quality>().unwrap(), Quality::MaxHeight(720));
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::MaxHeight(1080));
        assert!("hd".parse::<Quality>().is_err());
        assert!("0".parse::<Quality>().is_err());
    }

    #[test]
    fn download_kind_parses_labels() {
        assert_eq!("Shorts".parse::<DownloadKind>().unwrap(), DownloadKind::Shorts);
        assert_eq!("full".parse::<DownloadKind>().unwrap(), DownloadKind::Full);
        assert_eq!("".parse::<DownloadKind>().unwrap(), DownloadKind::All);
        assert!("live".parse::<DownloadKind>().is_err());
    }

    #[test]
    fn format_selector_follows_options() {
        let mut options = YoutubeOptions::default();
        assert_eq!(options.format_selector(), "best");

        options.quality = Quality::MaxHeight(720);
        assert_eq!(
            options.format_selector(),
            "bestvideo[height<=720]+bestaudio/best"
        );

        options.audio_only = true;
        assert_eq!(options.format_selector(), "bestaudio/best");
    }

    #[test]
    fn folder_label_uses_shorts_for_trending() {
        let mut options = YoutubeOptions::default();
        assert_eq!(options.folder_label(), "Full_Videos");
        options.trending_shorts = true;
        assert_eq!(options.folder_label(), "Shorts");
        options = YoutubeOptions {
            kind: DownloadKind::Shorts,
            ..YoutubeOptions::default()
        };
        assert_eq!(options.folder_label(), "Shorts");
    }

    #[test]
    fn build_args_caps_playlist_and_keeps_url_last() {
        let layout = OutputLayout::new("downloads");
        let options = YoutubeOptions {
            max_items: Some(3),
            ..YoutubeOptions::default()
        };
        let template = output_template(&layout, &options);
        assert_eq!(
            template,
            PathBuf::from("downloads/YouTube/%(uploader)s/Full_Videos/%(title)s.%(ext)s")
        );

        let args = build_args("https://youtube.com/@chan", &template, &options);
        let end = args.iter().position(|a| a == "--playlist-end").unwrap();
        assert_eq!(args[end + 1], "3");
        assert!(args.contains(&"--write-auto-subs".to_owned()));
        assert!(args.contains(&"--continue".to_owned()));
        assert_eq!(args.last().unwrap(), "https://youtube.com/@chan");
    }

    #[test]
    fn build_args_without_limit_omits_playlist_end() {
        let args = build_args(
            "https://youtu.be/x",
            Path::new("t"),
            &YoutubeOptions::default(),
        );
        assert!(!args.contains(&"--playlist-end".to_owned()));
    }

    #[test]
    fn download_reports_finish_partial_and_failure() -> Result<()> {
        let dir = tempdir()?;
        let layout = OutputLayout::new(dir.path().join("downloads"));

        let ok = install_stub(dir.path(), "yt-dlp-ok", "exit 0\n")?;
        let outcome = YoutubeDownloader::new(ok, layout.clone())
            .download("https://youtube.com/watch?v=a", &YoutubeOptions::default());
        assert!(outcome.is_finished());
        assert!(layout.root().join("YouTube").is_dir());

        let some_skipped = install_stub(dir.path(), "yt-dlp-partial", "exit 1\n")?;
        let outcome = YoutubeDownloader::new(some_skipped, layout.clone())
            .download("https://youtube.com/@chan", &YoutubeOptions::default());
        assert!(matches!(outcome, DownloadOutcome::Partial(_)));

        let bad = install_stub(dir.path(), "yt-dlp-bad", "exit 2\n")?;
        let outcome = YoutubeDownloader::new(bad, layout)
            .download("https://youtube.com/watch?v=a", &YoutubeOptions::default());
        assert!(matches!(outcome, DownloadOutcome::Failed(_)));
        Ok(())
    }
}
