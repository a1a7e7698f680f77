// Helper functions shared by the extractor and the downloader

use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};
use url::Url;

use super::errors::DownloadError;

/// Run command with timeout, collecting stdout and stderr
pub async fn run_output_with_timeout(
    program: &Path,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let name = tool_name(program);

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(&name, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stdout from {}", name)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stderr from {}", name)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, std::io::Error>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, std::io::Error>(buf)
    });

    let waited = timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res?;
            let stdout = stdout_task
                .await
                .map_err(|e| DownloadError::ExecutionError(format!("stdout task failed: {}", e)))??;
            let stderr = stderr_task
                .await
                .map_err(|e| DownloadError::ExecutionError(format!("stderr task failed: {}", e)))??;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Timeout(name, timeout_secs))
        }
    }
}

/// Map a spawn failure; a missing binary gets its own variant
pub fn spawn_error(tool: &str, err: std::io::Error) -> DownloadError {
    if err.kind() == std::io::ErrorKind::NotFound {
        DownloadError::ToolNotFound(tool.to_string())
    } else {
        DownloadError::ExecutionError(format!("Failed to start {}: {}", tool, err))
    }
}

/// File name of a tool path, for messages
pub fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned())
}

/// Accept only absolute http(s) URLs
pub fn validate_url(raw: &str) -> Result<Url, DownloadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::InvalidUrl("URL is required".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DownloadError::InvalidUrl(format!(
            "unsupported scheme `{}`",
            other
        ))),
    }
}

/// Keep ASCII letters, digits, space, '-' and '_' for a download file name
pub fn sanitize_filename(title: Option<&str>) -> String {
    let safe: String = title
        .unwrap_or("video")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    let safe = safe.trim();
    if safe.is_empty() {
        "video".to_string()
    } else {
        safe.to_string()
    }
}

/// Seconds as `m:ss`
pub fn format_duration(duration_secs: u64) -> String {
    format!("{}:{:02}", duration_secs / 60, duration_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename(Some("My Video: Part #1 (HD)")),
            "My Video Part 1 HD"
        );
        assert_eq!(sanitize_filename(Some("  a_b-c  ")), "a_b-c");
        assert_eq!(sanitize_filename(None), "video");
        assert_eq!(sanitize_filename(Some("日本語")), "video");
        assert_eq!(sanitize_filename(Some("\"quoted\"\r\n")), "quoted");
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://youtu.be/abc").is_ok());
        assert!(validate_url(" http://example.com/v.mp4 ").is_ok());
        assert!(matches!(validate_url(""), Err(DownloadError::InvalidUrl(_))));
        assert!(matches!(validate_url("file:///etc/passwd"), Err(DownloadError::InvalidUrl(_))));
        assert!(matches!(validate_url("--exec rm"), Err(DownloadError::InvalidUrl(_))));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(213), "3:33");
        assert_eq!(format_duration(3725), "62:05");
    }

    #[test]
    fn test_spawn_error_not_found() {
        let err = spawn_error("yt-dlp", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let res = run_output_with_timeout(Path::new("/nonexistent/yt-dlp"), vec![], 5).await;
        assert!(matches!(res, Err(DownloadError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_times_out() {
        let res = run_output_with_timeout(Path::new("sleep"), vec!["5".to_string()], 1).await;
        assert!(matches!(res, Err(DownloadError::Timeout(_, 1))));
    }
}
