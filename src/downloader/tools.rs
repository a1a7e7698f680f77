use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::utils::run_output_with_timeout;

const VERSION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn binary_names(&self) -> &'static [&'static str] {
        match self {
            ToolType::YtDlp => &["yt-dlp", "yt-dlp.exe"],
            ToolType::Ffmpeg => &["ffmpeg", "ffmpeg.exe"],
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg takes a single dash
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

/// Locates the external tools and reports their versions
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<PathBuf>,
    ffmpeg_override: Option<PathBuf>,
}

impl ToolManager {
    pub fn new(ytdlp_override: Option<PathBuf>, ffmpeg_override: Option<PathBuf>) -> Self {
        Self {
            ytdlp_override,
            ffmpeg_override,
        }
    }

    /// Path for a tool: configured override, then common locations, then PATH
    pub fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        let configured = match tool_type {
            ToolType::YtDlp => self.ytdlp_override.as_ref(),
            ToolType::Ffmpeg => self.ffmpeg_override.as_ref(),
        };
        if let Some(path) = configured {
            // An explicit setting is never second-guessed
            return Some(path.clone());
        }

        let found = Self::candidate_dirs()
            .into_iter()
            .chain(Self::path_dirs())
            .flat_map(|dir| {
                tool_type
                    .binary_names()
                    .iter()
                    .map(move |name| dir.join(name))
            })
            .find(|candidate| candidate.is_file());

        debug!(tool = tool_type.as_str(), path = ?found, "Tool lookup");
        found
    }

    /// Path to hand to the spawner; falls back to the bare name so PATH
    /// resolution still happens at spawn time.
    pub fn resolve(&self, tool_type: ToolType) -> PathBuf {
        self.locate(tool_type)
            .unwrap_or_else(|| PathBuf::from(tool_type.as_str()))
    }

    pub async fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type).filter(|p| p.is_file());
        let version = match &path {
            Some(p) => Self::get_version(p, tool_type).await,
            None => None,
        };

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            path: path.as_ref().map(|p| p.to_string_lossy().into_owned()),
            is_available: path.is_some(),
        }
    }

    pub async fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp).await,
            self.get_tool_info(ToolType::Ffmpeg).await,
        ]
    }

    fn candidate_dirs() -> Vec<PathBuf> {
        let mut dirs_list = vec![
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
        ];
        if let Some(home) = dirs::home_dir() {
            dirs_list.push(home.join(".local/bin"));
        }
        // a binary dropped next to the server
        if let Ok(cwd) = std::env::current_dir() {
            dirs_list.push(cwd);
        }
        dirs_list
    }

    fn path_dirs() -> Vec<PathBuf> {
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default()
    }

    async fn get_version(path: &Path, tool_type: ToolType) -> Option<String> {
        let args = vec![tool_type.version_arg().to_string()];
        match run_output_with_timeout(path, args, VERSION_TIMEOUT_SECS).await {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let manager = ToolManager::new(Some(PathBuf::from("/custom/yt-dlp")), None);
        assert_eq!(
            manager.locate(ToolType::YtDlp),
            Some(PathBuf::from("/custom/yt-dlp"))
        );
    }

    #[tokio::test]
    async fn test_missing_override_reports_unavailable() {
        let manager = ToolManager::new(Some(PathBuf::from("/nonexistent/yt-dlp")), None);
        let info = manager.get_tool_info(ToolType::YtDlp).await;
        assert_eq!(info.name, "yt-dlp");
        assert!(!info.is_available);
        assert!(info.version.is_none());
    }

    #[test]
    fn test_tool_type_serializes_kebab() {
        assert_eq!(
            serde_json::to_string(&ToolType::YtDlp).unwrap(),
            "\"yt-dlp\""
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_first_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'ffmpeg version 6.1 Copyright (c)'\necho 'built with gcc'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let manager = ToolManager::new(None, Some(script.clone()));
        let info = manager.get_tool_info(ToolType::Ffmpeg).await;
        assert!(info.is_available);
        assert_eq!(info.version.as_deref(), Some("ffmpeg version 6.1 Copyright (c)"));
    }
}
