// Error types for the yt-dlp orchestration layer

use thiserror::Error;

use super::extractors::{diagnose_error, BlockingReason};

#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp (or ffmpeg) could not be located or started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// URL rejected before anything was spawned
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The process ran but exited unsuccessfully
    #[error("{tool} exited with {}: {}", exit_label(.code), last_line(.stderr))]
    ProcessFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process did not finish within the allowed time
    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),

    /// Spawning, piping or waiting failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Best-effort classification of why the extractor refused the request
    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::ProcessFailed { stderr, .. } => diagnose_error(stderr),
            Self::Timeout(..) => Some(BlockingReason::NetworkTimeout),
            _ => None,
        }
    }

    /// Short human-readable detail for API responses
    pub fn detail(&self) -> String {
        match self.blocking_reason() {
            Some(reason) if reason != BlockingReason::Unknown => reason.description().to_string(),
            _ => self.to_string(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

fn last_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_display_uses_last_stderr_line() {
        let err = DownloadError::ProcessFailed {
            tool: "yt-dlp".to_string(),
            code: Some(1),
            stderr: "WARNING: something\nERROR: Unsupported URL: https://x\n\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "yt-dlp exited with exit code 1: ERROR: Unsupported URL: https://x"
        );
    }

    #[test]
    fn test_detail_prefers_diagnosis() {
        let err = DownloadError::ProcessFailed {
            tool: "yt-dlp".to_string(),
            code: Some(1),
            stderr: "ERROR: [youtube] abc: Private video".to_string(),
        };
        assert_eq!(err.detail(), "Private video");

        let timeout = DownloadError::Timeout("yt-dlp".to_string(), 60);
        assert_eq!(timeout.blocking_reason(), Some(BlockingReason::NetworkTimeout));
    }

    #[test]
    fn test_detail_falls_back_to_message() {
        let err = DownloadError::ToolNotFound("yt-dlp".to_string());
        assert_eq!(err.detail(), "Tool not found: yt-dlp");
    }
}
