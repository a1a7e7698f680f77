// Downloader module - orchestration over the yt-dlp command line

pub mod command;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod stream;
pub mod tools;
pub mod utils;

pub use command::OutputMode;
pub use errors::DownloadError;
pub use extractors::{BlockingReason, ExtractorConfig};
pub use format_selector::FormatSelector;
pub use models::{SavedDownload, VideoInfo};
pub use orchestrator::Downloader;
pub use stream::ProcessOutputStream;
pub use tools::{ToolInfo, ToolManager, ToolType};
