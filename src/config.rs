use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/socialdl-env";
pub const DEFAULT_DOWNLOAD_ROOT: &str = "downloads";
pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";
pub const DEFAULT_INSTALOADER_BIN: &str = "instaloader";
pub const DEFAULT_CRONTAB_BIN: &str = "crontab";

/// Raw values read from the env-style config file. Every key is optional.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub download_root: Option<PathBuf>,
    pub ytdlp_bin: Option<PathBuf>,
    pub ffmpeg_bin: Option<PathBuf>,
    pub instaloader_bin: Option<PathBuf>,
    pub crontab_bin: Option<PathBuf>,
}

/// Fully resolved settings handed to every component.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File the settings were read from. It need not exist.
    pub config_file: PathBuf,
    pub download_root: PathBuf,
    pub ytdlp_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub instaloader_bin: PathBuf,
    pub crontab_bin: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_PATH),
            download_root: PathBuf::from(DEFAULT_DOWNLOAD_ROOT),
            ytdlp_bin: PathBuf::from(DEFAULT_YTDLP_BIN),
            ffmpeg_bin: PathBuf::from(DEFAULT_FFMPEG_BIN),
            instaloader_bin: PathBuf::from(DEFAULT_INSTALOADER_BIN),
            crontab_bin: PathBuf::from(DEFAULT_CRONTAB_BIN),
        }
    }
}

impl Settings {
    /// Same defaults, rooted somewhere else. Mostly useful for tests and the
    /// `--download-root` flag.
    pub fn with_download_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.download_root = root.into();
        self
    }
}

pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value_raw)) = trimmed.split_once('=') {
            let value = value_raw.trim().trim_matches('"');
            if value.is_empty() {
                continue;
            }
            let value = PathBuf::from(value);
            match key.trim() {
                "DOWNLOAD_ROOT" => cfg.download_root = Some(value),
                "YTDLP_BIN" => cfg.ytdlp_bin = Some(value),
                "FFMPEG_BIN" => cfg.ffmpeg_bin = Some(value),
                "INSTALOADER_BIN" => cfg.instaloader_bin = Some(value),
                "CRONTAB_BIN" => cfg.crontab_bin = Some(value),
                _ => {}
            }
        }
    }
    Ok(Some(cfg))
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(Path::new(DEFAULT_CONFIG_PATH))
}

/// Reads `path` and fills the gaps with defaults. A missing file is not an
/// error: the tool works out of the box with everything on `PATH`.
pub fn load_settings_from(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let defaults = Settings {
        config_file: path.to_path_buf(),
        ..Settings::default()
    };
    let Some(cfg) = read_env_config(path)? else {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(defaults);
    };
    Ok(Settings {
        config_file: defaults.config_file,
        download_root: cfg.download_root.unwrap_or(defaults.download_root),
        ytdlp_bin: cfg.ytdlp_bin.unwrap_or(defaults.ytdlp_bin),
        ffmpeg_bin: cfg.ffmpeg_bin.unwrap_or(defaults.ffmpeg_bin),
        instaloader_bin: cfg.instaloader_bin.unwrap_or(defaults.instaloader_bin),
        crontab_bin: cfg.crontab_bin.unwrap_or(defaults.crontab_bin),
    })
}
