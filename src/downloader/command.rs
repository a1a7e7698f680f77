// yt-dlp argument construction for the metadata probe and both output modes

use std::path::{Path, PathBuf};

use super::extractors::ExtractorConfig;
use super::format_selector::FormatSelector;

/// Where yt-dlp should put the media
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Write into this folder using yt-dlp's default file name template
    SaveTo(PathBuf),
    /// Write the media to stdout (`-o -`) so it can be piped to a client
    Stdout,
}

/// Arguments for `--dump-json` metadata extraction
pub fn info_args(url: &str, config: &ExtractorConfig) -> Vec<String> {
    let mut args = vec!["--dump-json".to_string(), "--no-playlist".to_string()];
    args.extend(network_args(config));
    push_url(&mut args, url);
    args
}

/// Arguments for an actual download in the given mode
pub fn download_args(
    url: &str,
    quality: Option<u32>,
    mode: &OutputMode,
    config: &ExtractorConfig,
) -> Vec<String> {
    let mut args = vec!["--no-playlist".to_string()];

    match mode {
        OutputMode::SaveTo(folder) => {
            // One progress update per line so the log reader sees every step
            args.push("--newline".to_string());
            args.push("-P".to_string());
            args.push(path_arg(folder));
        }
        OutputMode::Stdout => {}
    }

    args.push("-f".to_string());
    args.push(FormatSelector::format_spec(quality));

    if *mode == OutputMode::Stdout {
        args.push("-o".to_string());
        args.push("-".to_string());
    }

    if let Some(ffmpeg) = &config.ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(path_arg(ffmpeg));
    }

    args.extend(network_args(config));
    push_url(&mut args, url);
    args
}

/// Proxy and socket timeout, only when configured
fn network_args(config: &ExtractorConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(timeout) = config.socket_timeout {
        args.push("--socket-timeout".to_string());
        args.push(timeout.to_string());
    }

    args
}

// The URL always comes after `--` so it can never be taken as an option.
fn push_url(args: &mut Vec<String>, url: &str) {
    args.push("--".to_string());
    args.push(url.to_string());
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_info_args_minimal() {
        let args = info_args(URL, &ExtractorConfig::default());
        assert_eq!(args, vec!["--dump-json", "--no-playlist", "--", URL]);
    }

    #[test]
    fn test_save_args_with_quality() {
        let mode = OutputMode::SaveTo(PathBuf::from("/srv/video_downloads"));
        let args = download_args(URL, Some(720), &mode, &ExtractorConfig::default());
        assert_eq!(
            args,
            vec![
                "--no-playlist",
                "--newline",
                "-P",
                "/srv/video_downloads",
                "-f",
                "best[height<=720][ext=mp4]/best[height<=720]",
                "--",
                URL,
            ]
        );
    }

    #[test]
    fn test_stream_args_without_quality() {
        let args = download_args(URL, None, &OutputMode::Stdout, &ExtractorConfig::default());
        assert_eq!(
            args,
            vec!["--no-playlist", "-f", "best[ext=mp4]", "-o", "-", "--", URL]
        );
        assert!(!args.contains(&"-P".to_string()));
    }

    #[test]
    fn test_configured_tools_and_network() {
        let config = ExtractorConfig::default()
            .with_proxy(Some("socks5://127.0.0.1:1080".to_string()))
            .with_socket_timeout(Some(15))
            .with_ffmpeg_location(Some(PathBuf::from("/usr/bin/ffmpeg")));

        let args = download_args(URL, Some(480), &OutputMode::Stdout, &config);
        let joined = args.join(" ");
        assert!(joined.contains("--ffmpeg-location /usr/bin/ffmpeg"));
        assert!(joined.contains("--proxy socks5://127.0.0.1:1080"));
        assert!(joined.contains("--socket-timeout 15"));
        assert!(joined.ends_with(&format!("-- {}", URL)));

        // metadata probes never need ffmpeg
        let info = info_args(URL, &config);
        assert!(!info.contains(&"--ffmpeg-location".to_string()));
        assert!(info.contains(&"--proxy".to_string()));
    }

    #[test]
    fn test_dash_leading_url_stays_positional() {
        let args = info_args("--exec=rm", &ExtractorConfig::default());
        let sep = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[sep + 1], "--exec=rm");
    }
}
