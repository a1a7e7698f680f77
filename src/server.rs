//! HTTP server: routes, shared state, startup and shutdown.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::downloader::{Downloader, ToolManager, ToolType};
use crate::ytdlp;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub downloader: Arc<Downloader>,
    pub tools: Arc<ToolManager>,
}

impl AppState {
    /// Locate the tools and build the downloader from configuration
    pub fn from_config(config: &Config) -> Self {
        let tools = ToolManager::new(config.ytdlp_path.clone(), config.ffmpeg_path.clone());

        let ytdlp_path = tools.resolve(ToolType::YtDlp);
        let ffmpeg_path = tools.locate(ToolType::Ffmpeg);
        match &ffmpeg_path {
            Some(path) => info!(path = %path.display(), "Using ffmpeg"),
            None => warn!("ffmpeg not found, higher qualities may fail to merge"),
        }
        info!(path = %ytdlp_path.display(), "Using yt-dlp");

        let downloader = Downloader::new(
            ytdlp_path,
            config.download_dir.clone(),
            config.extractor_config(ffmpeg_path),
        );

        Self {
            downloader: Arc::new(downloader),
            tools: Arc::new(tools),
        }
    }
}

pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route("/get-video", post(ytdlp::get_video))
        .route("/download-to-server", post(ytdlp::download_to_server))
        .route("/download-to-browser", post(ytdlp::download_to_browser))
        .route("/api/health", get(ytdlp::health))
        .route("/api/tools", get(ytdlp::tools_status))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run until Ctrl+C or SIGTERM
pub async fn start_server(mut config: Config) -> anyhow::Result<()> {
    config.download_dir = prepare_download_dir(&config.download_dir).await?;

    let state = AppState::from_config(&config);
    if !state.downloader.is_available().await {
        warn!(
            path = %state.downloader.ytdlp_path().display(),
            "yt-dlp not found, info requests will fail until it is installed"
        );
    }

    let app = build_router(state, &config.public_dir);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Server running at http://{} (downloads in {})",
        addr,
        config.download_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Create the download folder and return its absolute path
async fn prepare_download_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create download folder {}", dir.display()))?;
    tokio::fs::canonicalize(dir)
        .await
        .with_context(|| format!("Failed to resolve download folder {}", dir.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
