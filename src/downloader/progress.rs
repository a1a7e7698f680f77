// yt-dlp progress line parsing (save-to-folder mode runs with --newline)

use lazy_static::lazy_static;
use regex::Regex;

/// One recognised line of yt-dlp stdout
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// `[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59`
    Progress {
        percent: f32,
        total: String,
        speed: Option<String>,
        eta: Option<String>,
    },
    /// `[download] Destination: <path>`
    Destination(String),
    /// `[Merger] Merging formats into "<path>"`
    Merging(String),
    /// `[download] <path> has already been downloaded`
    AlreadyDownloaded(String),
}

impl ProgressLine {
    /// The output file this line names, if any
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Destination(path) | Self::Merging(path) | Self::AlreadyDownloaded(path) => {
                Some(path)
            }
            Self::Progress { .. } => None,
        }
    }
}

lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\S+)(?:\s+at\s+(\S+))?(?:\s+ETA\s+(\S+))?"
    )
    .expect("progress regex");
    static ref DEST_RE: Regex =
        Regex::new(r"\[download\]\s+Destination:\s+(.+)").expect("destination regex");
    static ref MERGE_RE: Regex =
        Regex::new(r#"\[Merger\]\s+Merging formats into\s+"(.+)""#).expect("merger regex");
    static ref ALREADY_RE: Regex =
        Regex::new(r"\[download\]\s+(.+?)\s+has already been downloaded").expect("already regex");
}

/// Parse a single stdout line
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        return Some(ProgressLine::Progress {
            percent,
            total: caps.get(2).map(|m| m.as_str().to_string())?,
            speed: caps.get(3).map(|m| m.as_str().to_string()),
            eta: caps.get(4).map(|m| m.as_str().to_string()),
        });
    }

    if let Some(caps) = DEST_RE.captures(line) {
        return Some(ProgressLine::Destination(caps[1].trim().to_string()));
    }

    if let Some(caps) = MERGE_RE.captures(line) {
        return Some(ProgressLine::Merging(caps[1].to_string()));
    }

    if let Some(caps) = ALREADY_RE.captures(line) {
        return Some(ProgressLine::AlreadyDownloaded(caps[1].to_string()));
    }

    None
}
