// InfoExtractor module - video metadata via `yt-dlp --dump-json`
//
// The extractor runs once per `/get-video` request; its reported formats feed
// the quality list the user picks from before the actual download run.

mod cli;
mod diagnostics;
mod traits;

pub use cli::CliInfoExtractor;
pub use diagnostics::{diagnose_error, BlockingReason};
pub use traits::{ExtendedFormat, ExtendedVideoInfo, ExtractorConfig, InfoExtractor};
