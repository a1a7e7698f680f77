// Failure diagnostics - identifies why yt-dlp refused a URL
//
// yt-dlp only reports failures as free text on stderr. This module maps the
// common messages onto a small set of reasons that can be shown to the user.

use serde::{Deserialize, Serialize};

/// Reasons the extractor might fail for a given URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Geographic restriction
    GeoBlocked,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// DRM-protected content, cannot be downloaded at all
    DrmProtected,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Bot detection / captcha
    BotDetection,

    /// Network timeout
    NetworkTimeout,

    /// No extractor for this site
    UnsupportedUrl,

    /// The requested format selector matched nothing
    FormatUnavailable,

    /// Generic/unknown failure
    Unknown,
}

impl BlockingReason {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::RateLimited => "Rate limited by the site",
            Self::GeoBlocked => "Geographic restriction",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::AgeRestricted => "Age-restricted content",
            Self::BotDetection => "Bot detection triggered",
            Self::NetworkTimeout => "Network timeout",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::FormatUnavailable => "Requested quality is not available",
            Self::Unknown => "Unknown error",
        }
    }
}

/// Analyze yt-dlp stderr and return the most specific reason found
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    // Check patterns in order of specificity

    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("playready")
        || lower.contains("fairplay")
    {
        return Some(BlockingReason::DrmProtected);
    }

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    if lower.contains("requested format is not available") {
        return Some(BlockingReason::FormatUnavailable);
    }

    if lower.contains("age-restricted")
        || lower.contains("sign in to confirm your age")
        || lower.contains("age_verification")
    {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("sign in if you've been granted access")
    {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("this video is no longer available")
        || lower.contains("video is unavailable")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restriction")
        || lower.contains("geo-restricted")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("http error 429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("http error 403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_403_detection() {
        let error = "ERROR: unable to download video data: HTTP Error 403: Forbidden";
        assert_eq!(diagnose_error(error), Some(BlockingReason::Http403Forbidden));
    }

    #[test]
    fn test_unsupported_url_detection() {
        let error = "ERROR: Unsupported URL: https://example.com/page";
        assert_eq!(diagnose_error(error), Some(BlockingReason::UnsupportedUrl));
    }

    #[test]
    fn test_format_unavailable_detection() {
        let error = "ERROR: [youtube] abc: Requested format is not available. Use --list-formats";
        assert_eq!(diagnose_error(error), Some(BlockingReason::FormatUnavailable));
    }

    #[test]
    fn test_age_restricted_detection() {
        let error = "ERROR: Sign in to confirm your age. This video may be inappropriate";
        assert_eq!(diagnose_error(error), Some(BlockingReason::AgeRestricted));
    }

    #[test]
    fn test_bot_detection_needs_specific_phrase() {
        let error = "Sign in to confirm you're not a bot";
        assert_eq!(diagnose_error(error), Some(BlockingReason::BotDetection));
        // "both" must not read as bot detection
        assert_eq!(
            diagnose_error("ERROR: both streams failed"),
            Some(BlockingReason::Unknown)
        );
    }

    #[test]
    fn test_timeout_detection() {
        let error = "ERROR: Unable to download webpage: The read operation timed out";
        assert_eq!(diagnose_error(error), Some(BlockingReason::NetworkTimeout));
    }

    #[test]
    fn test_geo_detection() {
        let error = "ERROR: [youtube] abc: The uploader has not made this video available in your country";
        assert_eq!(diagnose_error(error), Some(BlockingReason::GeoBlocked));
        let error = "ERROR: This video is not available in your country";
        assert_eq!(diagnose_error(error), Some(BlockingReason::GeoBlocked));
    }

    #[test]
    fn test_empty_stderr_has_no_reason() {
        assert_eq!(diagnose_error("  \n"), None);
    }
}
