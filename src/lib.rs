pub mod config;
pub mod downloader;
pub mod logging;
pub mod payload;
pub mod server;
pub mod ytdlp;

pub use config::Config;
pub use server::{build_router, start_server, AppState};

/// Initialize logging and serve until shutdown
pub async fn run(config: Config) -> anyhow::Result<()> {
    logging::init_logger(&config.log_level, config.log_json);
    start_server(config).await
}
