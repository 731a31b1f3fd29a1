//! URL classification.

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// Platforms the tool knows how to download from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
}

impl Platform {
    /// Directory name used under the download root.
    pub fn folder_name(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
        }
    }

    /// Lowercase name used on the command line and in cron entries.
    pub fn slug(self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "youtube" | "yt" => Ok(Platform::YouTube),
            "instagram" | "ig" => Ok(Platform::Instagram),
            "tiktok" | "tt" => Ok(Platform::TikTok),
            other => bail!("unsupported platform: {other}"),
        }
    }
}

/// Where a URL should be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    YouTube,
    Instagram,
    TikTok,
    Unsupported,
}

impl Route {
    pub fn platform(self) -> Option<Platform> {
        match self {
            Route::YouTube => Some(Platform::YouTube),
            Route::Instagram => Some(Platform::Instagram),
            Route::TikTok => Some(Platform::TikTok),
            Route::Unsupported => None,
        }
    }
}

/// Substring match on the URL, checked in youtube / instagram / tiktok order.
pub fn classify(url: &str) -> Route {
    let lower = url.to_ascii_lowercase();
    if lower.contains("youtube") || lower.contains("youtu.be") {
        Route::YouTube
    } else if lower.contains("instagram") {
        Route::Instagram
    } else if lower.contains("tiktok") {
        Route::TikTok
    } else {
        Route::Unsupported
    }
}

/// Last meaningful path segment of `url`: query and fragment are dropped and
/// a single trailing slash is ignored.
pub fn trailing_segment(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    let path = path.strip_suffix('/').unwrap_or(path);
    path.rsplit('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_routes_known_hosts() {
        assert_eq!(classify("https://www.youtube.com/watch?v=abc"), Route::YouTube);
        assert_eq!(classify("https://youtu.be/abc"), Route::YouTube);
        assert_eq!(classify("https://instagram.com/p/XyZ/"), Route::Instagram);
        assert_eq!(
            classify("https://www.TikTok.com/@user/video/123"),
            Route::TikTok
        );
        assert_eq!(classify("https://example.com/x"), Route::Unsupported);
        assert_eq!(classify(""), Route::Unsupported);
    }

    #[test]
    fn classify_prefers_youtube_on_overlap() {
        assert_eq!(
            classify("https://youtube.com/redirect?q=instagram"),
            Route::YouTube
        );
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::YouTube);
        assert_eq!(" tiktok ".parse::<Platform>().unwrap(), Platform::TikTok);
        assert!("vimeo".parse::<Platform>().is_err());
        assert_eq!(Platform::Instagram.slug(), "instagram");
        assert_eq!(Route::Unsupported.platform(), None);
    }

    #[test]
    fn trailing_segment_ignores_slash_and_query() {
        assert_eq!(trailing_segment("https://instagram.com/p/ABC/"), "ABC");
        assert_eq!(trailing_segment("https://instagram.com/p/ABC"), "ABC");
        assert_eq!(
            trailing_segment("https://www.tiktok.com/@u/video/123?lang=en"),
            "123"
        );
        assert_eq!(trailing_segment("https://x.com/a/#frag"), "a");
        assert_eq!(trailing_segment(""), "");
    }
}
