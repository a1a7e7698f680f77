// Common data models for the downloader

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::extractors::ExtendedVideoInfo;
use super::format_selector::FormatSelector;
use super::utils::format_duration;

/// Video information returned to the browser by `/get-video`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    /// Direct media URL reported by yt-dlp, usable for an in-page preview
    pub stream_url: Option<String>,
    /// Selectable heights, highest first
    pub qualities: Vec<u32>,
    pub id: String,
    pub uploader: String,
    /// `m:ss`
    pub duration: String,
    pub thumbnail: String,
}

impl From<ExtendedVideoInfo> for VideoInfo {
    fn from(info: ExtendedVideoInfo) -> Self {
        let qualities = FormatSelector::available_qualities(&info.formats);
        Self {
            title: info.title,
            stream_url: info.url,
            qualities,
            id: info.id,
            uploader: info.uploader,
            duration: format_duration(info.duration_seconds),
            thumbnail: info.thumbnail,
        }
    }
}

/// Result of a completed save-to-folder run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub folder: PathBuf,
    /// Final file, when yt-dlp reported it
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::extractors::ExtendedFormat;

    fn format(ext: &str, height: Option<u32>) -> ExtendedFormat {
        ExtendedFormat {
            format_id: "f".to_string(),
            ext: ext.to_string(),
            width: None,
            height,
            fps: None,
            vcodec: None,
            acodec: None,
            filesize: None,
            filesize_approx: None,
            tbr: None,
            format_note: None,
            video_only: false,
            audio_only: false,
        }
    }

    #[test]
    fn test_video_info_from_extended() {
        let info = ExtendedVideoInfo {
            id: "abc".to_string(),
            title: "Clip".to_string(),
            uploader: "Someone".to_string(),
            duration_seconds: 61,
            thumbnail: String::new(),
            webpage_url: String::new(),
            url: Some("https://cdn.example.com/a.mp4".to_string()),
            formats: vec![format("mp4", Some(360)), format("mp4", Some(720)), format("webm", Some(1080))],
        };

        let video = VideoInfo::from(info);
        assert_eq!(video.qualities, vec![720, 360]);
        assert_eq!(video.duration, "1:01");

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["streamUrl"], "https://cdn.example.com/a.mp4");
        assert_eq!(json["qualities"], serde_json::json!([720, 360]));
    }
}
