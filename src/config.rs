use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::downloader::ExtractorConfig;

/// Runtime configuration for the local downloader service.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address
    pub host: IpAddr,
    /// HTTP port
    pub port: u16,
    /// Folder for "download to server"
    pub download_dir: PathBuf,
    /// Static front-end files
    pub public_dir: PathBuf,
    /// Explicit yt-dlp binary; searched for when unset
    pub ytdlp_path: Option<PathBuf>,
    /// Explicit ffmpeg binary; searched for when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Proxy handed to yt-dlp
    pub proxy: Option<String>,
    /// yt-dlp `--socket-timeout`
    pub socket_timeout: Option<u32>,
    /// Limit for the metadata probe
    pub info_timeout_secs: u64,
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of plain text
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            download_dir: PathBuf::from("video_downloads"),
            public_dir: PathBuf::from("public"),
            ytdlp_path: None,
            ffmpeg_path: None,
            proxy: None,
            socket_timeout: None,
            info_timeout_secs: 60,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("LVD_HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),
            port: non_empty("LVD_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            download_dir: non_empty("LVD_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            public_dir: non_empty("LVD_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            ytdlp_path: non_empty("LVD_YTDLP_PATH").map(PathBuf::from),
            ffmpeg_path: non_empty("LVD_FFMPEG_PATH").map(PathBuf::from),
            proxy: non_empty("LVD_PROXY"),
            socket_timeout: non_empty("LVD_SOCKET_TIMEOUT").and_then(|t| t.parse().ok()),
            info_timeout_secs: non_empty("LVD_INFO_TIMEOUT")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.info_timeout_secs),
            log_level: non_empty("LVD_LOG_LEVEL")
                .or_else(|| non_empty("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            log_json: non_empty("LVD_LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Options shared by every yt-dlp invocation
    pub fn extractor_config(&self, ffmpeg_location: Option<PathBuf>) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_proxy(self.proxy.clone())
            .with_socket_timeout(self.socket_timeout)
            .with_timeout(self.info_timeout_secs)
            .with_ffmpeg_location(ffmpeg_location)
    }
}
