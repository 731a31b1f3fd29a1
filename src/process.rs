//! Small wrappers around `std::process::Command`.
//!
//! Every external tool is started with an argument vector, never through a
//! shell, so file names derived from URLs cannot inject anything.

use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Runs `<program> --version` and fails loudly when the tool is missing.
pub fn ensure_program_available(program: &Path) -> Result<()> {
    let status = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => bail!(
            "{} is installed but returned a failure status",
            program.display()
        ),
        Err(err) => bail!("{} is not installed or not in PATH: {}", program.display(), err),
    }
}

/// Renders a command for log lines.
pub fn format_command<I, S>(program: &Path, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.as_ref().to_string_lossy());
    }
    rendered
}

/// Runs the command with inherited stdio and returns its exit status.
pub fn run_status(program: &Path, args: &[String]) -> Result<ExitStatus> {
    tracing::debug!("running {}", format_command(program, args));
    Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run {}", program.display()))
}

/// Runs the command with stdout/stderr discarded. Only a spawn failure is an
/// error; the exit status is handed back for the caller to judge.
pub fn run_quiet(program: &Path, args: &[String]) -> Result<ExitStatus> {
    tracing::debug!("running {}", format_command(program, args));
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("Failed to run {}", program.display()))
}

/// Runs the command and returns stdout, failing on a non-zero exit.
pub fn run_capture(program: &Path, args: &[String]) -> Result<Vec<u8>> {
    tracing::debug!("running {}", format_command(program, args));
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run {}", program.display()))?;
    if !output.status.success() {
        bail!(
            "{} exited with status {}",
            program.display(),
            output.status
        );
    }
    Ok(output.stdout)
}

/// Drops an executable bash script into `dir`. The library and binary tests
/// use it to stand in for yt-dlp, ffmpeg, instaloader and crontab.
#[doc(hidden)]
pub fn install_stub(dir: &Path, name: &str, body: &str) -> Result<std::path::PathBuf> {
    use std::fs;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    let script_path = dir.join(name);
    fs::write(&script_path, format!("#!/usr/bin/env bash\n{body}"))?;
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&script_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms)?;
    }
    Ok(script_path)
}
