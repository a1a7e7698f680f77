// CLI InfoExtractor - uses the native `yt-dlp` binary

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::traits::{ExtendedFormat, ExtendedVideoInfo, ExtractorConfig, InfoExtractor};
use crate::downloader::command::info_args;
use crate::downloader::errors::DownloadError;
use crate::downloader::utils::{run_output_with_timeout, tool_name};

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: PathBuf,
}

impl CliInfoExtractor {
    pub fn new(ytdlp_path: PathBuf) -> Self {
        Self { ytdlp_path }
    }

    /// Parse `--dump-json` output
    ///
    /// Only the first JSON document is used; a playlist URL that slips past
    /// `--no-playlist` prints one document per line.
    pub fn parse_json(stdout: &[u8]) -> Result<ExtendedVideoInfo, DownloadError> {
        let json: serde_json::Value = serde_json::Deserializer::from_slice(stdout)
            .into_iter::<serde_json::Value>()
            .next()
            .ok_or_else(|| DownloadError::ParseError("Empty output".to_string()))?
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        if !json.is_object() {
            return Err(DownloadError::ParseError(
                "Expected a JSON object".to_string(),
            ));
        }

        Ok(ExtendedVideoInfo {
            id: json["id"].as_str().unwrap_or("unknown").to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
            duration_seconds: json["duration"].as_f64().unwrap_or(0.0).max(0.0) as u64,
            thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
            webpage_url: json["webpage_url"].as_str().unwrap_or("").to_string(),
            url: json["url"].as_str().map(|s| s.to_string()),
            formats: Self::parse_formats(&json),
        })
    }

    fn parse_formats(json: &serde_json::Value) -> Vec<ExtendedFormat> {
        let formats_array = match json["formats"].as_array() {
            Some(f) => f,
            None => return Vec::new(),
        };

        formats_array
            .iter()
            .map(|f| {
                let vcodec = f["vcodec"].as_str().map(|s| s.to_string());
                let acodec = f["acodec"].as_str().map(|s| s.to_string());

                let video_only = vcodec.as_ref().map_or(false, |v| v != "none")
                    && acodec.as_ref().map_or(true, |a| a == "none");
                let audio_only = acodec.as_ref().map_or(false, |a| a != "none")
                    && vcodec.as_ref().map_or(true, |v| v == "none");

                ExtendedFormat {
                    format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                    ext: f["ext"].as_str().unwrap_or("").to_string(),
                    width: f["width"].as_u64().map(|w| w as u32),
                    height: f["height"].as_u64().map(|h| h as u32),
                    fps: f["fps"].as_f64().map(|fps| fps as f32),
                    vcodec,
                    acodec,
                    filesize: f["filesize"].as_u64(),
                    filesize_approx: f["filesize_approx"].as_u64(),
                    tbr: f["tbr"].as_f64().map(|t| t as f32),
                    format_note: f["format_note"].as_str().map(|s| s.to_string()),
                    video_only,
                    audio_only,
                }
            })
            .collect()
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn is_available(&self) -> bool {
        match tokio::fs::metadata(&self.ytdlp_path).await {
            Ok(meta) => meta.is_file(),
            // bare names like "yt-dlp" are left to PATH lookup at spawn time
            Err(_) => self.ytdlp_path.components().count() == 1,
        }
    }

    async fn extract(
        &self,
        url: &str,
        config: &ExtractorConfig,
    ) -> Result<ExtendedVideoInfo, DownloadError> {
        let args = info_args(url, config);
        debug!(
            program = %self.ytdlp_path.display(),
            args = %args.join(" "),
            "Running metadata probe"
        );

        let out = run_output_with_timeout(&self.ytdlp_path, args, config.timeout_seconds).await?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).to_string();
            warn!(
                url = %url,
                code = ?out.status.code(),
                "Metadata probe failed"
            );
            return Err(DownloadError::ProcessFailed {
                tool: tool_name(&self.ytdlp_path),
                code: out.status.code(),
                stderr,
            });
        }

        let info = Self::parse_json(&out.stdout)?;
        info!(
            url = %url,
            title = %info.title,
            formats = info.formats.len(),
            "Fetched video info"
        );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "abc123",
        "title": "Sample clip",
        "uploader": "Someone",
        "duration": 125.4,
        "thumbnail": "https://i.example.com/abc.jpg",
        "webpage_url": "https://example.com/watch?v=abc123",
        "url": "https://cdn.example.com/abc.mp4",
        "formats": [
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5},
            {"format_id": "18", "ext": "mp4", "width": 640, "height": 360, "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "filesize": 1000},
            {"format_id": "137", "ext": "mp4", "width": 1920, "height": 1080, "vcodec": "avc1.640028", "acodec": "none"}
        ]
    }"#;

    #[test]
    fn test_parse_full_document() {
        let info = CliInfoExtractor::parse_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.title, "Sample clip");
        assert_eq!(info.duration_seconds, 125);
        assert_eq!(info.url.as_deref(), Some("https://cdn.example.com/abc.mp4"));
        assert_eq!(info.formats.len(), 3);
        assert!(info.formats[0].audio_only);
        assert!(info.formats[2].video_only);
        assert_eq!(info.formats[1].filesize, Some(1000));
    }

    #[test]
    fn test_parse_defaults_for_missing_fields() {
        let info = CliInfoExtractor::parse_json(br#"{"id": "x"}"#).unwrap();
        assert_eq!(info.title, "Unknown");
        assert!(info.url.is_none());
        assert!(info.formats.is_empty());
    }

    #[test]
    fn test_parse_uses_first_document() {
        let out = b"{\"title\": \"first\"}\n{\"title\": \"second\"}\n";
        let info = CliInfoExtractor::parse_json(out).unwrap();
        assert_eq!(info.title, "first");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            CliInfoExtractor::parse_json(b""),
            Err(DownloadError::ParseError(_))
        ));
        assert!(matches!(
            CliInfoExtractor::parse_json(b"not json"),
            Err(DownloadError::ParseError(_))
        ));
        assert!(matches!(
            CliInfoExtractor::parse_json(b"[1, 2]"),
            Err(DownloadError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_not_available() {
        let extractor = CliInfoExtractor::new(PathBuf::from("/nonexistent/dir/yt-dlp"));
        assert!(!extractor.is_available().await);
    }
}
