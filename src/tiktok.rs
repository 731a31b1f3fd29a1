//! TikTok downloads: fetch the raw video bytes, write them once, optionally
//! pull the audio out with ffmpeg.

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::layout::{OutputLayout, is_duplicate};
use crate::media::MediaTool;
use crate::outcome::DownloadOutcome;
use crate::platform::{Platform, trailing_segment};
use crate::process::run_capture;

/// Turns a video page URL into the bytes of the video file.
pub trait VideoBytesClient {
    fn video_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Subset of `yt-dlp --dump-single-json` needed to fetch the media directly.
#[derive(Debug, Deserialize)]
struct ResolvedVideo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    http_headers: BTreeMap<String, String>,
    #[serde(default)]
    formats: Vec<ResolvedFormat>,
}

#[derive(Debug, Deserialize)]
struct ResolvedFormat {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    http_headers: BTreeMap<String, String>,
}

impl ResolvedVideo {
    /// Direct media URL plus the headers the CDN expects. yt-dlp puts the
    /// chosen format at the top level; otherwise the last (best) format wins.
    fn media_request(&self) -> Option<(&str, &BTreeMap<String, String>)> {
        if let Some(url) = self.url.as_deref() {
            return Some((url, &self.http_headers));
        }
        self.formats
            .iter()
            .rev()
            .find_map(|f| f.url.as_deref().map(|url| (url, &f.http_headers)))
    }
}

/// Resolves the media URL with yt-dlp and downloads it with `ureq`.
#[derive(Debug, Clone)]
pub struct YtDlpVideoClient {
    ytdlp: PathBuf,
}

impl YtDlpVideoClient {
    pub fn new(ytdlp: impl Into<PathBuf>) -> Self {
        Self {
            ytdlp: ytdlp.into(),
        }
    }

    fn resolve(&self, url: &str) -> Result<ResolvedVideo> {
        let args = [
            "--dump-single-json",
            "--no-playlist",
            "--no-warnings",
            "--format",
            "best",
            "--",
            url,
        ]
        .map(str::to_owned);
        let raw = run_capture(&self.ytdlp, &args)
            .with_context(|| format!("resolving TikTok video {url}"))?;
        serde_json::from_slice(&raw).context("deserializing yt-dlp metadata JSON")
    }
}

impl VideoBytesClient for YtDlpVideoClient {
    fn video_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(url)?;
        let (media_url, headers) = resolved
            .media_request()
            .ok_or_else(|| anyhow!("no downloadable media for {url}"))?;
        tracing::debug!(
            "fetching TikTok media for {}",
            resolved.id.as_deref().unwrap_or(url)
        );

        let mut request = ureq::get(media_url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        let response = request
            .call()
            .with_context(|| format!("downloading media for {url}"))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .with_context(|| format!("reading media body for {url}"))?;
        Ok(bytes)
    }
}

/// File name used for a TikTok URL: the trailing path segment plus `.mp4`.
pub fn video_file_name(url: &str) -> Option<String> {
    let id = trailing_segment(url);
    (!id.is_empty()).then(|| format!("{id}.mp4"))
}

#[derive(Debug, Clone)]
pub struct TikTokDownloader<C> {
    client: C,
    media: MediaTool,
    layout: OutputLayout,
}

impl<C: VideoBytesClient> TikTokDownloader<C> {
    pub fn new(client: C, media: MediaTool, layout: OutputLayout) -> Self {
        Self {
            client,
            media,
            layout,
        }
    }

    pub fn download(&self, url: &str, audio_only: bool) -> DownloadOutcome {
        let outcome = match self.try_download(url, audio_only) {
            Ok(outcome) => outcome,
            Err(err) => DownloadOutcome::failed(format!("{err:#}")),
        };
        outcome.report("TikTok")
    }

    fn try_download(&self, url: &str, audio_only: bool) -> Result<DownloadOutcome> {
        let Some(file_name) = video_file_name(url) else {
            bail!("no video id in {url}");
        };
        let folder = self.layout.platform_folder(Platform::TikTok.folder_name())?;
        let target = folder.join(file_name);

        // Checked before fetching so a known video costs no network round trip.
        if is_duplicate(&target) {
            return Ok(DownloadOutcome::Skipped(target));
        }

        let bytes = self.client.video_bytes(url)?;
        write_video(&target, &bytes)?;

        let mut written = vec![target];
        if audio_only {
            let audio = self.media.extract_audio(&written[0])?;
            println!("✅ Audio extracted: {}", audio.display());
            written.push(audio);
        }
        Ok(DownloadOutcome::Finished(written))
    }
}

/// Writes into a temp file next to `target` and renames it into place, so the
/// final name only ever holds a complete video.
fn write_video(target: &Path, bytes: &[u8]) -> Result<()> {
    let folder = target.parent().unwrap_or(Path::new("."));
    let mut file = NamedTempFile::new_in(folder)
        .with_context(|| format!("creating temp file in {}", folder.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("writing {}", target.display()))?;
    file.persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("moving video to {}", target.display()))?;
    Ok(())
}
