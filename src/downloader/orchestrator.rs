// Downloader - runs the two-step "probe, then download" workflow

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::BufReader;
use tokio::process::{Child, Command as TokioCommand};
use tracing::{debug, info, warn};

use super::command::{download_args, OutputMode};
use super::errors::DownloadError;
use super::extractors::{CliInfoExtractor, ExtractorConfig, InfoExtractor};
use super::models::{SavedDownload, VideoInfo};
use super::progress::{parse_progress_line, ProgressLine};
use super::stream::{drain_stderr, read_line_lossy, wait_for_exit, ProcessOutputStream};
use super::utils::{spawn_error, tool_name};

pub struct Downloader {
    extractor: Box<dyn InfoExtractor>,
    ytdlp_path: PathBuf,
    download_dir: PathBuf,
    config: ExtractorConfig,
}

impl Downloader {
    pub fn new(ytdlp_path: PathBuf, download_dir: PathBuf, config: ExtractorConfig) -> Self {
        Self {
            extractor: Box::new(CliInfoExtractor::new(ytdlp_path.clone())),
            ytdlp_path,
            download_dir,
            config,
        }
    }

    /// Swap the metadata extractor
    pub fn with_extractor(mut self, extractor: Box<dyn InfoExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    pub async fn is_available(&self) -> bool {
        self.extractor.is_available().await
    }

    /// Step one: metadata and the qualities the user can pick from
    pub async fn fetch_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        debug!(extractor = self.extractor.name(), url = %url, "Fetching video info");
        let info = self.extractor.extract(url, &self.config).await?;
        Ok(VideoInfo::from(info))
    }

    /// Step two, option A: download into the server-side folder
    pub async fn save_to_folder(
        &self,
        url: &str,
        quality: Option<u32>,
    ) -> Result<SavedDownload, DownloadError> {
        let mode = OutputMode::SaveTo(self.download_dir.clone());
        let mut child = self.spawn(download_args(url, quality, &mode, &self.config))?;
        let tool = tool_name(&self.ytdlp_path);

        let stdout = child.stdout.take().ok_or_else(|| {
            DownloadError::ExecutionError(format!("Failed to capture stdout from {}", tool))
        })?;
        let stderr_tail = child
            .stderr
            .take()
            .map(|stderr| drain_stderr(stderr, tool.clone()));

        let mut file: Option<PathBuf> = None;
        let mut last_logged_step: i32 = -1;
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        while let Some(line) = read_line_lossy(&mut reader, &mut buf).await? {
            match parse_progress_line(&line) {
                Some(ProgressLine::Progress {
                    percent,
                    total,
                    speed,
                    eta,
                }) => {
                    // one log line per 10% step
                    let step = (percent / 10.0).floor() as i32;
                    if step > last_logged_step {
                        last_logged_step = step;
                        info!(
                            url = %url,
                            percent,
                            total = %total,
                            speed = speed.as_deref().unwrap_or("?"),
                            eta = eta.as_deref().unwrap_or("?"),
                            "Progress"
                        );
                    }
                }
                Some(event) => {
                    if let Some(path) = event.file() {
                        info!(url = %url, file = %path, "Output file");
                        file = Some(PathBuf::from(path));
                    }
                }
                None => debug!(tool = %tool, "{}", line),
            }
        }

        wait_for_exit(tool, child, stderr_tail).await?;

        info!(url = %url, folder = %self.download_dir.display(), "Saved to server folder");
        Ok(SavedDownload {
            folder: self.download_dir.clone(),
            file,
        })
    }

    /// Step two, option B: media on stdout, relayed while yt-dlp runs
    pub async fn stream(
        &self,
        url: &str,
        quality: Option<u32>,
    ) -> Result<ProcessOutputStream, DownloadError> {
        let child = self.spawn(download_args(url, quality, &OutputMode::Stdout, &self.config))?;
        let mut stream = ProcessOutputStream::new(tool_name(&self.ytdlp_path), child)?;
        stream.prime().await?;
        info!(url = %url, quality = ?quality, "Streaming to client");
        Ok(stream)
    }

    fn spawn(&self, args: Vec<String>) -> Result<Child, DownloadError> {
        debug!(
            program = %self.ytdlp_path.display(),
            args = %args.join(" "),
            "Spawning yt-dlp"
        );

        TokioCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                warn!(program = %self.ytdlp_path.display(), error = %e, "Failed to spawn");
                spawn_error(&tool_name(&self.ytdlp_path), e)
            })
    }
}
