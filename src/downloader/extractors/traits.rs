// InfoExtractor trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::downloader::errors::DownloadError;

/// Configuration for info extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// SOCKS5/HTTP proxy URL handed to yt-dlp
    pub proxy: Option<String>,
    /// yt-dlp `--socket-timeout` in seconds
    pub socket_timeout: Option<u32>,
    /// Wall-clock limit for the whole `--dump-json` run
    pub timeout_seconds: u64,
    /// ffmpeg binary (or its directory) for `--ffmpeg-location`
    pub ffmpeg_location: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            socket_timeout: None,
            timeout_seconds: 60,
            ffmpeg_location: None,
        }
    }
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: Option<u32>) -> Self {
        self.socket_timeout = seconds;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }
}

/// Format information from yt-dlp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedFormat {
    /// Format ID (e.g., "18", "137")
    pub format_id: String,
    /// File extension (mp4, webm, m4a)
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f32>,
    /// Video codec (avc1, vp9, av01, none)
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    /// Total bitrate in kbps
    pub tbr: Option<f32>,
    pub format_note: Option<String>,
    pub video_only: bool,
    pub audio_only: bool,
}

impl ExtendedFormat {
    pub fn is_mp4(&self) -> bool {
        self.ext == "mp4"
    }
}

/// Video info with all formats, as reported by `--dump-json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedVideoInfo {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration_seconds: u64,
    pub thumbnail: String,
    pub webpage_url: String,
    /// Direct media URL of yt-dlp's default pick, when it has one
    pub url: Option<String>,
    pub formats: Vec<ExtendedFormat>,
}

/// Trait for info extractors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    async fn is_available(&self) -> bool;

    /// Extract video info with formats
    async fn extract(
        &self,
        url: &str,
        config: &ExtractorConfig,
    ) -> Result<ExtendedVideoInfo, DownloadError>;
}
