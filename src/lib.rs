#![forbid(unsafe_code)]

//! Shared pieces of the `socialdl` downloader.
//!
//! Each platform wraps one external tool (yt-dlp, instaloader, ffmpeg,
//! crontab) and writes below a single download root taken from
//! [`config::Settings`]. The binary in `src/bin/socialdl.rs` is only the menu
//! on top.

pub mod batch;
pub mod caption;
pub mod config;
pub mod downloaders;
pub mod instagram;
pub mod layout;
pub mod media;
pub mod outcome;
pub mod platform;
pub mod process;
pub mod schedule;
pub mod tiktok;
pub mod youtube;
