use crate::batch::Dispatch;
use crate::config::Settings;
use crate::instagram::{InstagramDownloader, Instaloader};
use crate::layout::OutputLayout;
use crate::media::MediaTool;
use crate::outcome::DownloadOutcome;
use crate::platform::Platform;
use crate::tiktok::{TikTokDownloader, YtDlpVideoClient};
use crate::youtube::{YoutubeDownloader, YoutubeOptions};

/// The three platform downloaders wired to the real external tools.
pub struct Downloaders {
    pub youtube: YoutubeDownloader,
    pub instagram: InstagramDownloader<Instaloader>,
    pub tiktok: TikTokDownloader<YtDlpVideoClient>,
}

impl Downloaders {
    pub fn from_settings(settings: &Settings) -> Self {
        let layout = OutputLayout::new(&settings.download_root);
        Self {
            youtube: YoutubeDownloader::new(&settings.ytdlp_bin, layout.clone()),
            instagram: InstagramDownloader::new(
                Instaloader::new(&settings.instaloader_bin),
                layout.clone(),
            ),
            tiktok: TikTokDownloader::new(
                YtDlpVideoClient::new(&settings.ytdlp_bin),
                MediaTool::new(&settings.ffmpeg_bin),
                layout,
            ),
        }
    }

    /// Runs `url` with each platform's default options. Used by batch files
    /// and scheduled `--auto` runs.
    pub fn download_with_defaults(&self, platform: Platform, url: &str) -> DownloadOutcome {
        match platform {
            Platform::YouTube => self.youtube.download(url, &YoutubeOptions::default()),
            Platform::Instagram => self.instagram.download(url),
            Platform::TikTok => self.tiktok.download(url, false),
        }
    }
}

impl Dispatch for Downloaders {
    fn dispatch(&mut self, platform: Platform, url: &str) -> DownloadOutcome {
        self.download_with_defaults(platform, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::install_stub;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn defaults_route_to_configured_tools() -> Result<()> {
        let dir = tempdir()?;
        let settings = Settings {
            ytdlp_bin: install_stub(dir.path(), "yt-dlp", "exit 0\n")?,
            instaloader_bin: install_stub(dir.path(), "instaloader", "exit 2\n")?,
            ..Settings::default().with_download_root(dir.path().join("downloads"))
        };
        let mut downloaders = Downloaders::from_settings(&settings);

        assert!(
            downloaders
                .dispatch(Platform::YouTube, "https://youtube.com/watch?v=1")
                .is_finished()
        );
        assert!(matches!(
            downloaders.dispatch(Platform::Instagram, "https://instagram.com/p/x/"),
            DownloadOutcome::Failed(_)
        ));
        Ok(())
    }
}
