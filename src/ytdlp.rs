// HTTP endpoints over the downloader

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::downloader::utils::{sanitize_filename, validate_url};
use crate::downloader::{DownloadError, ToolInfo, VideoInfo};
use crate::payload::{deserialize_quality, JsonOrForm, PayloadRejection};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct GetVideoRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_quality")]
    pub quality: Option<u32>,
    /// Only used for the browser download file name
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error body for the JSON endpoints
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    /// `{"error": ...}` shape used by `/get-video`
    fn info(status: StatusCode, error: &str, detail: Option<String>) -> Self {
        let mut body = serde_json::json!({ "error": error });
        if let Some(detail) = detail {
            body["detail"] = serde_json::Value::String(detail);
        }
        Self { status, body }
    }

    /// `{"success": false, ...}` shape used by the download endpoints
    fn download(status: StatusCode, message: &str, detail: Option<String>) -> Self {
        let body = DownloadResponse {
            success: false,
            message: message.to_string(),
            file: None,
            detail,
        };
        Self {
            status,
            body: serde_json::to_value(body).unwrap_or_default(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// POST /get-video: probe the URL and list the selectable qualities
pub async fn get_video(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<GetVideoRequest>,
) -> Result<Json<VideoInfo>, ApiError> {
    let url = validate_url(&req.url)
        .map_err(|e| ApiError::info(StatusCode::BAD_REQUEST, &e.to_string(), None))?;

    if !state.downloader.is_available().await {
        warn!(path = %state.downloader.ytdlp_path().display(), "yt-dlp not found");
        return Err(ApiError::info(
            StatusCode::INTERNAL_SERVER_ERROR,
            "yt-dlp missing!",
            None,
        ));
    }

    match state.downloader.fetch_info(url.as_str()).await {
        Ok(info) => Ok(Json(info)),
        Err(DownloadError::ParseError(msg)) => {
            warn!(url = %url, error = %msg, "Could not parse yt-dlp output");
            Err(ApiError::info(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error parsing data.",
                None,
            ))
        }
        Err(DownloadError::ToolNotFound(_)) => Err(ApiError::info(
            StatusCode::INTERNAL_SERVER_ERROR,
            "yt-dlp missing!",
            None,
        )),
        Err(e) => {
            warn!(url = %url, error = %e, "Could not fetch video info");
            Err(ApiError::info(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not fetch video info.",
                Some(e.detail()),
            ))
        }
    }
}

/// Rejected body in the download endpoints' response shape
fn download_payload(
    payload: Result<JsonOrForm<DownloadRequest>, PayloadRejection>,
) -> Result<DownloadRequest, ApiError> {
    payload
        .map(|JsonOrForm(req)| req)
        .map_err(|rejection| ApiError::download(rejection.status, &rejection.message, None))
}

/// POST /download-to-server: save into the configured folder
pub async fn download_to_server(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<DownloadRequest>, PayloadRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let req = download_payload(payload)?;
    let url = validate_url(&req.url)
        .map_err(|e| ApiError::download(StatusCode::BAD_REQUEST, &e.to_string(), None))?;
    info!(url = %url, quality = ?req.quality, "[Server Download] Starting");

    match state.downloader.save_to_folder(url.as_str(), req.quality).await {
        Ok(saved) => Ok(Json(DownloadResponse {
            success: true,
            message: format!("Saved to {}", saved.folder.display()),
            file: saved.file.map(|f| f.to_string_lossy().into_owned()),
            detail: None,
        })),
        Err(e) => {
            warn!(url = %url, error = %e, "Server download failed");
            Err(ApiError::download(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Download failed.",
                Some(e.detail()),
            ))
        }
    }
}

/// POST /download-to-browser: relay yt-dlp's stdout as an mp4 attachment
pub async fn download_to_browser(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<DownloadRequest>, PayloadRejection>,
) -> Result<Response, ApiError> {
    let req = download_payload(payload)?;
    let url = validate_url(&req.url)
        .map_err(|e| ApiError::download(StatusCode::BAD_REQUEST, &e.to_string(), None))?;
    let filename = format!("{}.mp4", sanitize_filename(req.title.as_deref()));
    info!(url = %url, file = %filename, quality = ?req.quality, "[Browser Stream] Starting");

    let stream = state
        .downloader
        .stream(url.as_str(), req.quality)
        .await
        .map_err(|e| {
            warn!(url = %url, error = %e, "Browser stream failed to start");
            ApiError::download(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Download failed.",
                Some(e.detail()),
            )
        })?;

    let headers = [
        (header::CONTENT_TYPE, "video/mp4".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/tools: where yt-dlp and ffmpeg were found, and their versions
pub async fn tools_status(State(state): State<AppState>) -> Json<Vec<ToolInfo>> {
    Json(state.tools.get_all_tools().await)
}
