// FormatSelector - quality options and yt-dlp format selectors
//
// The UI offers the heights of the progressive mp4 formats yt-dlp reports,
// and the chosen height is turned back into a `-f` selector for the second
// yt-dlp run.

use super::extractors::ExtendedFormat;

pub struct FormatSelector;

impl FormatSelector {
    /// Distinct heights of mp4 formats, highest first
    pub fn available_qualities(formats: &[ExtendedFormat]) -> Vec<u32> {
        let mut heights: Vec<u32> = formats
            .iter()
            .filter(|f| f.is_mp4())
            .filter_map(|f| f.height)
            .filter(|h| *h > 0)
            .collect();

        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();
        heights
    }

    /// yt-dlp `-f` selector for an optional maximum height
    pub fn format_spec(quality: Option<u32>) -> String {
        match quality {
            Some(height) => format!(
                "best[height<={}][ext=mp4]/best[height<={}]",
                height, height
            ),
            None => "best[ext=mp4]".to_string(),
        }
    }

    /// Parse a user-supplied quality ("720", "720p", "" ...)
    ///
    /// Empty input and `0` mean "no preference". Anything that is not a
    /// plain height is rejected so it never reaches the `-f` selector.
    pub fn parse_quality(raw: &str) -> Result<Option<u32>, String> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Ok(None);
        }

        match digits.parse::<u32>() {
            Ok(0) => Ok(None),
            Ok(height) => Ok(Some(height)),
            Err(_) => Err(format!("invalid quality `{}`", raw)),
        }
    }
}
