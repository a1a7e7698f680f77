use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use local_video_downloader::Config;

/// Local web front-end for yt-dlp
#[derive(Debug, Parser)]
#[command(name = "local-downloader", version, about)]
struct Cli {
    /// Bind address (LVD_HOST)
    #[arg(long)]
    host: Option<IpAddr>,

    /// HTTP port (LVD_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Folder used by "download to server" (LVD_DOWNLOAD_DIR)
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Static front-end files (LVD_PUBLIC_DIR)
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// yt-dlp binary (LVD_YTDLP_PATH)
    #[arg(long)]
    ytdlp_path: Option<PathBuf>,

    /// ffmpeg binary (LVD_FFMPEG_PATH)
    #[arg(long)]
    ffmpeg_path: Option<PathBuf>,

    /// Proxy passed to yt-dlp (LVD_PROXY)
    #[arg(long)]
    proxy: Option<String>,

    /// Log level or filter (LVD_LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// JSON log lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = self.download_dir {
            config.download_dir = dir;
        }
        if let Some(dir) = self.public_dir {
            config.public_dir = dir;
        }
        if self.ytdlp_path.is_some() {
            config.ytdlp_path = self.ytdlp_path;
        }
        if self.ffmpeg_path.is_some() {
            config.ffmpeg_path = self.ffmpeg_path;
        }
        if self.proxy.is_some() {
            config.proxy = self.proxy;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config.log_json |= self.log_json;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().apply(Config::from_env());
    local_video_downloader::run(config).await
}
