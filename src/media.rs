//! ffmpeg post-processing: merging split streams, pulling audio out of a
//! video, and rendering short GIF previews.
//!
//! ffmpeg's exit status is only logged. The merge step decides what to do
//! purely on whether the output file showed up.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::process::run_quiet;

pub const PREVIEW_FILTER: &str = "fps=15,scale=320:-1:flags=lanczos";

/// Time window for a preview clip, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewWindow {
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl Default for PreviewWindow {
    fn default() -> Self {
        Self {
            start_secs: 0.0,
            duration_secs: 5.0,
        }
    }
}

/// A finite, non-negative number of seconds, as typed at a prompt. Anything
/// else would reach ffmpeg's `-ss`/`-t` unchecked.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Seconds(f64);

impl Seconds {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl FromStr for Seconds {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let secs: f64 = trimmed
            .parse()
            .with_context(|| format!("invalid number of seconds '{trimmed}'"))?;
        if !secs.is_finite() || secs < 0.0 {
            bail!("seconds must be a finite number >= 0, got '{trimmed}'");
        }
        Ok(Seconds(secs))
    }
}

/// What happened to the source files after a merge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Output exists, both inputs were removed.
    Merged,
    /// No output, inputs left where they were.
    Kept,
}

#[derive(Debug, Clone)]
pub struct MediaTool {
    ffmpeg: PathBuf,
}

impl MediaTool {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Remuxes `video` and `audio` into `output` without re-encoding. Both
    /// inputs are deleted once `output` exists; there is no way back.
    pub fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<MergeOutcome> {
        let status = run_quiet(&self.ffmpeg, &merge_args(video, audio, output))?;
        if !status.success() {
            tracing::debug!("ffmpeg merge exited with {status}");
        }

        if !output.exists() {
            tracing::warn!(
                "merge produced no {}, keeping sources",
                output.display()
            );
            return Ok(MergeOutcome::Kept);
        }

        fs::remove_file(video).with_context(|| format!("removing {}", video.display()))?;
        fs::remove_file(audio).with_context(|| format!("removing {}", audio.display()))?;
        Ok(MergeOutcome::Merged)
    }

    /// Writes the audio track of `video` next to it as `<stem>.mp3`.
    pub fn extract_audio(&self, video: &Path) -> Result<PathBuf> {
        let audio = video.with_extension("mp3");
        let status = run_quiet(&self.ffmpeg, &extract_audio_args(video, &audio))?;
        if !status.success() {
            tracing::warn!("ffmpeg audio extraction exited with {status}");
        }
        Ok(audio)
    }

    /// Renders a small looping GIF (`<stem>.gif`) from part of `video`.
    pub fn preview_clip(&self, video: &Path, window: PreviewWindow) -> Result<PathBuf> {
        let gif = video.with_extension("gif");
        let status = run_quiet(&self.ffmpeg, &preview_args(video, &gif, window))?;
        if !status.success() {
            tracing::warn!("ffmpeg preview exited with {status}");
        }
        Ok(gif)
    }
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        lossy(video),
        "-i".into(),
        lossy(audio),
        "-c".into(),
        "copy".into(),
        lossy(output),
    ]
}

pub fn extract_audio_args(video: &Path, audio: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        lossy(video),
        "-q:a".into(),
        "0".into(),
        "-map".into(),
        "a".into(),
        lossy(audio),
    ]
}

pub fn preview_args(video: &Path, gif: &Path, window: PreviewWindow) -> Vec<String> {
    vec![
        "-y".into(),
        "-ss".into(),
        window.start_secs.to_string(),
        "-t".into(),
        window.duration_secs.to_string(),
        "-i".into(),
        lossy(video),
        "-vf".into(),
        PREVIEW_FILTER.into(),
        lossy(gif),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::install_stub;
    use tempfile::tempdir;

    // Touches whatever path comes last, like a successful ffmpeg run.
    const WRITING_FFMPEG: &str = "for last in \"$@\"; do :; done\necho out > \"$last\"\n";

    fn sources(dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let video = dir.join("clip.f137.mp4");
        let audio = dir.join("clip.f140.m4a");
        fs::write(&video, b"video")?;
        fs::write(&audio, b"audio")?;
        Ok((video, audio))
    }

    #[test]
    fn merge_removes_sources_when_output_appears() -> Result<()> {
        let dir = tempdir()?;
        let ffmpeg = install_stub(dir.path(), "ffmpeg", WRITING_FFMPEG)?;
        let (video, audio) = sources(dir.path())?;
        let output = dir.path().join("clip.mp4");

        let outcome = MediaTool::new(ffmpeg).merge(&video, &audio, &output)?;
        assert_eq!(outcome, MergeOutcome::Merged);
        assert!(output.exists());
        assert!(!video.exists());
        assert!(!audio.exists());
        Ok(())
    }

    #[test]
    fn merge_keeps_sources_without_output_even_on_success_status() -> Result<()> {
        let dir = tempdir()?;
        let ffmpeg = install_stub(dir.path(), "ffmpeg", "exit 0\n")?;
        let (video, audio) = sources(dir.path())?;
        let output = dir.path().join("clip.mp4");

        let outcome = MediaTool::new(ffmpeg).merge(&video, &audio, &output)?;
        assert_eq!(outcome, MergeOutcome::Kept);
        assert!(video.exists());
        assert!(audio.exists());
        Ok(())
    }

    #[test]
    fn merge_trusts_output_over_exit_status() -> Result<()> {
        let dir = tempdir()?;
        let body = format!("{WRITING_FFMPEG}exit 1\n");
        let ffmpeg = install_stub(dir.path(), "ffmpeg", &body)?;
        let (video, audio) = sources(dir.path())?;
        let output = dir.path().join("clip.mp4");

        let outcome = MediaTool::new(ffmpeg).merge(&video, &audio, &output)?;
        assert_eq!(outcome, MergeOutcome::Merged);
        Ok(())
    }

    #[test]
    fn extract_audio_targets_mp3_sibling() -> Result<()> {
        let dir = tempdir()?;
        let ffmpeg = install_stub(dir.path(), "ffmpeg", WRITING_FFMPEG)?;
        let video = dir.path().join("123.mp4");
        fs::write(&video, b"v")?;
        let audio = MediaTool::new(ffmpeg).extract_audio(&video)?;
        assert_eq!(audio, dir.path().join("123.mp3"));
        assert!(audio.exists());
        Ok(())
    }

    #[test]
    fn preview_args_include_window_and_filter() {
        let args = preview_args(
            Path::new("a.mp4"),
            Path::new("a.gif"),
            PreviewWindow {
                start_secs: 12.5,
                duration_secs: 3.0,
            },
        );
        assert_eq!(
            args,
            vec![
                "-y", "-ss", "12.5", "-t", "3", "-i", "a.mp4", "-vf", PREVIEW_FILTER, "a.gif"
            ]
        );
    }

    #[test]
    fn seconds_accept_only_finite_non_negative_values() {
        assert_eq!("12.5".parse::<Seconds>().unwrap().get(), 12.5);
        assert_eq!(" 0 ".parse::<Seconds>().unwrap().get(), 0.0);
        for bad in ["NaN", "inf", "-inf", "-1", "soon"] {
            assert!(bad.parse::<Seconds>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn missing_ffmpeg_is_an_error() {
        let dir = tempdir().unwrap();
        let tool = MediaTool::new(dir.path().join("ffmpeg"));
        assert!(tool.extract_audio(&dir.path().join("x.mp4")).is_err());
    }
}
