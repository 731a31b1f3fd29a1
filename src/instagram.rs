//! Single-post Instagram downloads through instaloader.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use crate::layout::OutputLayout;
use crate::outcome::DownloadOutcome;
use crate::platform::{Platform, trailing_segment};
use crate::process::run_status;

/// Anything able to fetch one post by shortcode into a folder.
pub trait PostClient {
    fn download_post(&self, shortcode: &str, target_dir: &Path) -> Result<()>;
}

/// Shells out to the `instaloader` CLI. `-<shortcode>` is its syntax for a
/// single post.
#[derive(Debug, Clone)]
pub struct Instaloader {
    program: PathBuf,
}

impl Instaloader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

pub fn instaloader_args(shortcode: &str, target_dir: &Path) -> Vec<String> {
    vec![
        "--dirname-pattern".to_owned(),
        target_dir.to_string_lossy().into_owned(),
        "--no-compress-json".to_owned(),
        "--".to_owned(),
        format!("-{shortcode}"),
    ]
}

impl PostClient for Instaloader {
    fn download_post(&self, shortcode: &str, target_dir: &Path) -> Result<()> {
        let status = run_status(&self.program, &instaloader_args(shortcode, target_dir))?;
        if !status.success() {
            bail!("instaloader exited with status {status} for post {shortcode}");
        }
        Ok(())
    }
}

/// Pulls the post shortcode out of a URL such as
/// `https://www.instagram.com/p/Cx1AbC/`.
pub fn extract_shortcode(url: &str) -> Option<&str> {
    let code = trailing_segment(url);
    (!code.is_empty()).then_some(code)
}

#[derive(Debug, Clone)]
pub struct InstagramDownloader<C> {
    client: C,
    layout: OutputLayout,
}

impl<C: PostClient> InstagramDownloader<C> {
    pub fn new(client: C, layout: OutputLayout) -> Self {
        Self { client, layout }
    }

    /// Downloads one post. Client failures end the request with a single
    /// failure line; nothing is retried.
    pub fn download(&self, url: &str) -> DownloadOutcome {
        let outcome = match self.try_download(url) {
            Ok(folder) => DownloadOutcome::Finished(vec![folder]),
            Err(err) => DownloadOutcome::failed(format!("{err:#}")),
        };
        outcome.report("Instagram")
    }

    fn try_download(&self, url: &str) -> Result<PathBuf> {
        let Some(shortcode) = extract_shortcode(url) else {
            bail!("no post shortcode in {url}");
        };
        let folder = self.layout.platform_folder(Platform::Instagram.folder_name())?;
        tracing::info!("downloading Instagram post {shortcode}");
        self.client.download_post(shortcode, &folder)?;
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::install_stub;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeClient {
        calls: RefCell<Vec<(String, PathBuf)>>,
        fail: bool,
    }

    impl PostClient for FakeClient {
        fn download_post(&self, shortcode: &str, target_dir: &Path) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((shortcode.to_owned(), target_dir.to_path_buf()));
            if self.fail {
                return Err(anyhow!("login required"));
            }
            Ok(())
        }
    }

    #[test]
    fn shortcode_comes_from_segment_before_trailing_slash() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/CxYz123/"),
            Some("CxYz123")
        );
        assert_eq!(
            extract_shortcode("https://www.instagram.com/reel/Abc?igsh=xyz"),
            Some("Abc")
        );
        assert_eq!(extract_shortcode("https://instagram.com/p/Q/"), Some("Q"));
        assert_eq!(extract_shortcode(""), None);
    }

    #[test]
    fn download_passes_shortcode_and_folder_to_client() -> Result<()> {
        let dir = tempdir()?;
        let layout = OutputLayout::new(dir.path());
        let downloader = InstagramDownloader::new(FakeClient::default(), layout);

        let outcome = downloader.download("https://www.instagram.com/p/B_code/");
        assert!(outcome.is_finished());

        let calls = downloader.client.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "B_code");
        assert_eq!(calls[0].1, dir.path().join("Instagram/Unknown/All"));
        assert!(calls[0].1.is_dir());
        Ok(())
    }

    #[test]
    fn client_error_becomes_single_failure() -> Result<()> {
        let dir = tempdir()?;
        let client = FakeClient {
            fail: true,
            ..FakeClient::default()
        };
        let downloader = InstagramDownloader::new(client, OutputLayout::new(dir.path()));

        let outcome = downloader.download("https://instagram.com/p/Locked/");
        assert_eq!(outcome, DownloadOutcome::Failed("login required".into()));
        assert_eq!(downloader.client.calls.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn instaloader_receives_single_post_target() -> Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("args.txt");
        let body = format!("printf '%s\\n' \"$@\" > '{}'\n", log.display());
        let stub = install_stub(dir.path(), "instaloader", &body)?;

        Instaloader::new(stub).download_post("AbC", dir.path())?;
        let recorded = fs::read_to_string(&log)?;
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(args.last(), Some(&"-AbC"));
        assert_eq!(args[0], "--dirname-pattern");
        Ok(())
    }

    #[test]
    fn instaloader_failure_status_is_error() -> Result<()> {
        let dir = tempdir()?;
        let stub = install_stub(dir.path(), "instaloader", "exit 1\n")?;
        assert!(Instaloader::new(stub).download_post("x", dir.path()).is_err());
        Ok(())
    }
}
