#![forbid(unsafe_code)]

//! Interactive front-end: a numbered menu that collects the options for one
//! request and hands them to the library. `--auto <url> <platform>` skips the
//! menu; that is what the crontab entries created by option 5 call.

use anyhow::{Context, Result, bail};
use clap::Parser;
use socialdl_tools::batch::run_batch;
use socialdl_tools::caption::{parse_hashtags, share_caption};
use socialdl_tools::config::{DEFAULT_CONFIG_PATH, Settings, load_settings_from};
use socialdl_tools::downloaders::Downloaders;
use socialdl_tools::media::{MediaTool, MergeOutcome, PreviewWindow, Seconds};
use socialdl_tools::outcome::DownloadOutcome;
use socialdl_tools::platform::Platform;
use socialdl_tools::process::ensure_program_available;
use socialdl_tools::schedule::{CronTable, Registration, ScheduledJob, parse_time};
use socialdl_tools::youtube::{DownloadKind, Quality, YoutubeOptions};
use std::env;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download media from YouTube, Instagram and TikTok.")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH, help = "Path to the config file")]
    config: PathBuf,
    #[arg(
        long = "download-root",
        value_name = "PATH",
        help = "Override the download directory (default ./downloads)"
    )]
    download_root: Option<PathBuf>,
    #[arg(
        long = "auto",
        num_args = 2,
        value_names = ["URL", "PLATFORM"],
        help = "Download URL with default options and exit (used by scheduled jobs)"
    )]
    auto: Option<Vec<String>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings_from(&cli.config)?;
    if let Some(root) = cli.download_root {
        settings = settings.with_download_root(root);
    }

    if let Some(auto) = cli.auto.as_deref() {
        let [url, platform] = auto else {
            bail!("--auto expects <URL> <PLATFORM>");
        };
        return run_auto(&settings, url, platform);
    }

    let stdin = io::stdin();
    let mut prompt = Prompt::new(stdin.lock(), io::stdout());
    run_menu(&settings, &mut prompt)
}

/// Non-interactive run for cron. A failed download turns into a non-zero exit
/// so cron mails the error.
fn run_auto(settings: &Settings, url: &str, platform: &str) -> Result<()> {
    let platform: Platform = platform.parse()?;
    tracing::info!("scheduled run for {url} ({platform})");
    let downloaders = Downloaders::from_settings(settings);
    match downloaders.download_with_defaults(platform, url) {
        DownloadOutcome::Failed(message) => bail!("scheduled {platform} download failed: {message}"),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    YouTube,
    Instagram,
    TikTok,
    Batch,
    Schedule,
    Preview,
    Merge,
    Caption,
}

impl MenuChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::YouTube),
            "2" => Some(MenuChoice::Instagram),
            "3" => Some(MenuChoice::TikTok),
            "4" => Some(MenuChoice::Batch),
            "5" => Some(MenuChoice::Schedule),
            "6" => Some(MenuChoice::Preview),
            "7" => Some(MenuChoice::Merge),
            "8" => Some(MenuChoice::Caption),
            _ => None,
        }
    }

    /// Executables this choice shells out to.
    fn required_tools(self, settings: &Settings) -> Vec<&Path> {
        let tools: Vec<&PathBuf> = match self {
            MenuChoice::YouTube => vec![&settings.ytdlp_bin],
            MenuChoice::Instagram => vec![&settings.instaloader_bin],
            MenuChoice::TikTok => vec![&settings.ytdlp_bin, &settings.ffmpeg_bin],
            MenuChoice::Batch => vec![&settings.ytdlp_bin, &settings.instaloader_bin],
            MenuChoice::Schedule => vec![&settings.crontab_bin],
            MenuChoice::Preview | MenuChoice::Merge => vec![&settings.ffmpeg_bin],
            MenuChoice::Caption => Vec::new(),
        };
        tools.into_iter().map(PathBuf::as_path).collect()
    }
}

const MENU: &[&str] = &[
    "1. YouTube",
    "2. Instagram",
    "3. TikTok",
    "4. Batch download from file",
    "5. Schedule daily download",
    "6. Create preview GIF from a video",
    "7. Merge video and audio files",
    "8. Compose share caption",
];

/// Line-oriented prompts over any reader/writer pair.
struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.output, "{line}").context("writing to terminal")
    }

    /// Asks once and returns the trimmed answer. End of input aborts.
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush().ok();
        let mut line = String::new();
        if self.input.read_line(&mut line).context("reading input")? == 0 {
            bail!("Input aborted");
        }
        Ok(line.trim().to_owned())
    }

    /// `y`/`yes` is true, anything else (including Enter) is false.
    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} (y/n) [default n]"))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    /// Re-asks until the answer parses.
    fn ask_parsed<T>(&mut self, question: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        loop {
            let answer = self.ask(question)?;
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(err) => self.say(format!("❌ {err}"))?,
            }
        }
    }

    /// Like [`Self::ask_parsed`] but Enter yields `None`.
    fn ask_optional<T>(&mut self, question: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(err) => self.say(format!("❌ {err}"))?,
            }
        }
    }
}

fn run_menu<R: BufRead, W: Write>(settings: &Settings, prompt: &mut Prompt<R, W>) -> Result<()> {
    prompt.say("=== Ultimate Social Media Downloader ===")?;
    for line in MENU {
        prompt.say(line)?;
    }
    let answer = prompt.ask("Choose platform/mode (1-8)")?;
    let Some(choice) = MenuChoice::parse(&answer) else {
        prompt.say("❌ Invalid choice!")?;
        return Ok(());
    };

    for tool in choice.required_tools(settings) {
        if let Err(err) = ensure_program_available(tool) {
            tracing::warn!("{err:#}");
            prompt.say(format!("Warning: {err}"))?;
        }
    }

    match choice {
        MenuChoice::YouTube => youtube_flow(settings, prompt),
        MenuChoice::Instagram => {
            let url = prompt.ask("Enter Instagram post URL")?;
            Downloaders::from_settings(settings).instagram.download(&url);
            Ok(())
        }
        MenuChoice::TikTok => {
            let url = prompt.ask("Enter TikTok URL")?;
            let audio_only = prompt.ask_yes_no("Audio-only?")?;
            Downloaders::from_settings(settings)
                .tiktok
                .download(&url, audio_only);
            Ok(())
        }
        MenuChoice::Batch => batch_flow(settings, prompt),
        MenuChoice::Schedule => schedule_flow(settings, prompt),
        MenuChoice::Preview => preview_flow(settings, prompt),
        MenuChoice::Merge => merge_flow(settings, prompt),
        MenuChoice::Caption => {
            let title = prompt.ask("Title")?;
            let channel = prompt.ask("Channel")?;
            let tags = prompt.ask("Hashtags (space or comma separated)")?;
            prompt.say(share_caption(&title, &channel, &parse_hashtags(&tags)))
        }
    }
}

fn youtube_flow<R: BufRead, W: Write>(settings: &Settings, prompt: &mut Prompt<R, W>) -> Result<()> {
    let url = prompt.ask("Enter YouTube URL / Playlist / Channel")?;
    let quality: Quality = prompt.ask_parsed("Video quality (360,720,1080,best) [default best]")?;
    let max_items: Option<u32> =
        prompt.ask_optional("Number of videos/shorts to download (Enter for all)")?;
    let kind: DownloadKind = prompt.ask_parsed("Download type (shorts/full/all) [default all]")?;
    let trending_shorts = prompt.ask_yes_no("Auto-detect trending shorts?")?;
    let audio_only = prompt.ask_yes_no("Audio-only?")?;

    let options = YoutubeOptions {
        quality,
        max_items,
        kind,
        trending_shorts,
        audio_only,
    };
    Downloaders::from_settings(settings)
        .youtube
        .download(&url, &options);
    Ok(())
}

fn batch_flow<R: BufRead, W: Write>(settings: &Settings, prompt: &mut Prompt<R, W>) -> Result<()> {
    let path = PathBuf::from(prompt.ask("Enter path to text file with URLs")?);
    let mut downloaders = Downloaders::from_settings(settings);
    let report = run_batch(&path, &mut downloaders)?;
    prompt.say(format!(
        "Batch finished: {} processed, {} failed, {} unsupported",
        report.dispatched.len(),
        report.failures(),
        report.unsupported.len()
    ))
}

fn schedule_flow<R: BufRead, W: Write>(
    settings: &Settings,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    let url = prompt.ask("Enter channel/playlist URL")?;
    let platform: Platform = prompt.ask_parsed("Platform (youtube/instagram/tiktok)")?;
    let time = loop {
        let answer = prompt.ask("Time of day (HH:MM) [default 09:00]")?;
        match parse_time(&answer) {
            Ok(time) => break time,
            Err(err) => prompt.say(format!("❌ {err}"))?,
        }
    };

    let program = env::current_exe().context("locating the socialdl executable")?;
    let job = ScheduledJob::new(program, settings, url, platform, time)?;
    let when = time.format("%H:%M");
    match CronTable::new(&settings.crontab_bin).register(&job)? {
        Registration::Added => {
            prompt.say(format!("✅ Scheduled daily download for {platform} at {when}"))
        }
        Registration::AlreadyPresent => {
            prompt.say(format!("⚠️ Already scheduled for {platform} at {when}"))
        }
    }
}

fn preview_flow<R: BufRead, W: Write>(settings: &Settings, prompt: &mut Prompt<R, W>) -> Result<()> {
    let video = PathBuf::from(prompt.ask("Path to video file")?);
    let defaults = PreviewWindow::default();
    let start: Option<Seconds> = prompt.ask_optional("Start time in seconds [default 0]")?;
    let duration: Option<Seconds> = prompt.ask_optional("Duration in seconds [default 5]")?;
    let window = PreviewWindow {
        start_secs: start.map_or(defaults.start_secs, Seconds::get),
        duration_secs: duration.map_or(defaults.duration_secs, Seconds::get),
    };
    if !video.is_file() {
        return prompt.say(format!("❌ Failed: {} does not exist", video.display()));
    }
    let gif = MediaTool::new(&settings.ffmpeg_bin).preview_clip(&video, window)?;
    prompt.say(format!("✅ GIF created: {}", gif.display()))
}

fn merge_flow<R: BufRead, W: Write>(settings: &Settings, prompt: &mut Prompt<R, W>) -> Result<()> {
    let video = PathBuf::from(prompt.ask("Path to video file")?);
    let audio = PathBuf::from(prompt.ask("Path to audio file")?);
    let output = PathBuf::from(prompt.ask("Output file (e.g. merged.mp4)")?);
    match MediaTool::new(&settings.ffmpeg_bin).merge(&video, &audio, &output)? {
        MergeOutcome::Merged => prompt.say(format!("✅ Merged into {}", output.display())),
        MergeOutcome::Kept => prompt.say(format!(
            "❌ Failed: {} was not created, sources kept",
            output.display()
        )),
    }
}
