//! Daily re-runs through the user's crontab.
//!
//! The registered entry calls this binary back with `--auto <url> <platform>`
//! plus the config file and download root in effect at registration; the CLI
//! handles it without showing the menu.

use anyhow::{Context, Result, bail};
use chrono::{NaiveTime, Timelike};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Settings;
use crate::platform::Platform;
use crate::process::format_command;

pub const DEFAULT_TIME: &str = "09:00";

/// What `crontab -l` prints on stderr for a user who has no table yet.
const NO_CRONTAB: &str = "no crontab for";

/// Parses `HH:MM` (24h clock).
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    let trimmed = if trimmed.is_empty() { DEFAULT_TIME } else { trimmed };
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .with_context(|| format!("invalid time '{trimmed}', expected HH:MM"))
}

/// Single-quotes `value` for `/bin/sh`, which is what cron runs entries with.
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::from("'");
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\"'\"'");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// One daily re-run. The settings it was registered with travel along so the
/// job writes where the user asked, whatever directory cron starts it in.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub program: PathBuf,
    pub config_file: PathBuf,
    pub download_root: PathBuf,
    pub url: String,
    pub platform: Platform,
    pub time: NaiveTime,
}

impl ScheduledJob {
    /// Job for `url` under `settings`, with both paths made absolute.
    pub fn new(
        program: impl Into<PathBuf>,
        settings: &Settings,
        url: impl Into<String>,
        platform: Platform,
        time: NaiveTime,
    ) -> Result<Self> {
        Ok(Self {
            program: program.into(),
            config_file: absolute_path(&settings.config_file)?,
            download_root: absolute_path(&settings.download_root)?,
            url: url.into(),
            platform,
            time,
        })
    }

    /// `<min> <hour> * * * '<program>' --config '<file>' --download-root '<dir>'
    /// --auto '<url>' '<platform>'`, with every `%` escaped for cron.
    pub fn cron_line(&self) -> String {
        let command = [
            shell_quote(&self.program.to_string_lossy()),
            "--config".to_owned(),
            shell_quote(&self.config_file.to_string_lossy()),
            "--download-root".to_owned(),
            shell_quote(&self.download_root.to_string_lossy()),
            "--auto".to_owned(),
            shell_quote(&self.url),
            shell_quote(self.platform.slug()),
        ]
        .join(" ");
        format!(
            "{} {} * * * {}",
            self.time.minute(),
            self.time.hour(),
            escape_percent(&command)
        )
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolving {}", path.display()))
}

/// cron turns a bare `%` in the command field into a newline and feeds the
/// rest to stdin, quoted or not.
fn escape_percent(command: &str) -> String {
    command.replace('%', "\\%")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyPresent,
}

/// Returns the table with `line` appended, or `None` when it is already there.
pub fn append_entry(table: &str, line: &str) -> Option<String> {
    if table.lines().any(|existing| existing.trim() == line) {
        return None;
    }
    let mut updated = table.to_owned();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    Some(updated)
}

/// Thin client for the `crontab` executable.
#[derive(Debug, Clone)]
pub struct CronTable {
    crontab: PathBuf,
}

impl CronTable {
    pub fn new(crontab: impl Into<PathBuf>) -> Self {
        Self {
            crontab: crontab.into(),
        }
    }

    /// Current table. A user without a crontab yet gets an empty string; any
    /// other failure is an error, so a table that could not be read is never
    /// overwritten.
    pub fn read(&self) -> Result<String> {
        tracing::debug!("running {}", format_command(&self.crontab, ["-l"]));
        let output = Command::new(&self.crontab)
            .arg("-l")
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", self.crontab.display()))?;
        if output.status.success() {
            return String::from_utf8(output.stdout).context("crontab output is not UTF-8");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(NO_CRONTAB) {
            return Ok(String::new());
        }
        bail!(
            "{} -l failed with status {}: {}",
            self.crontab.display(),
            output.status,
            stderr.trim()
        );
    }

    /// Replaces the whole table with `contents`.
    pub fn write(&self, contents: &str) -> Result<()> {
        tracing::debug!("running {}", format_command(&self.crontab, ["-"]));
        let mut child = Command::new(&self.crontab)
            .arg("-")
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.crontab.display()))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(contents.as_bytes())
                .context("writing new crontab")?;
        }
        let status = child.wait().context("waiting for crontab")?;
        if !status.success() {
            bail!("{} failed with status {status}", self.crontab.display());
        }
        Ok(())
    }

    pub fn register(&self, job: &ScheduledJob) -> Result<Registration> {
        let line = job.cron_line();
        let current = self.read()?;
        match append_entry(&current, &line) {
            Some(updated) => {
                self.write(&updated)?;
                tracing::info!("added cron entry: {line}");
                Ok(Registration::Added)
            }
            None => Ok(Registration::AlreadyPresent),
        }
    }
}
