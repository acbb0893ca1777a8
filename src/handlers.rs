use crate::{
    download,
    error::AppError,
    extractor::VideoExtractor,
    models::{DetailsRequest, DownloadRequest, FormatList, FormatsRequest, VideoDetails},
    selector, AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

// ===================================================================
//                          DOWNLOAD HANDLER
// ===================================================================

/// # POST /download - Resolves a format id and serves the muxed file.
pub async fn download_video(
    State(state): State<AppState>,
    Json(payload): Json<DownloadRequest>,
) -> Result<Response, AppError> {
    let (url, format_id) = match (non_empty(payload.url), non_empty(payload.format_id)) {
        (Some(url), Some(format_id)) => (url, format_id),
        _ => return Err(AppError::BadRequest("Missing URL or format_id".to_string())),
    };

    tracing::info!("Download requested for {} (format {})", url, format_id);

    // List-only lookup first; the raw descriptor list decides how the chosen
    // id maps onto a concrete download spec.
    let info = state
        .extractor
        .extract_info(&url)
        .await
        .map_err(|e| AppError::Extraction(e.to_string()))?;

    let format_spec = selector::resolve_download_spec(&info.formats, &format_id)?;

    let path = download::fetch(state.extractor.as_ref(), &state.config, &url, &format_spec).await?;
    download::serve_and_cleanup(state.cleanups.clone(), path).await
}

// ===================================================================
//                          FORMATS HANDLER
// ===================================================================

/// # POST /formats - Lists the best downloadable format per resolution.
pub async fn list_formats(
    State(state): State<AppState>,
    Json(payload): Json<FormatsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(url) = non_empty(payload.url) else {
        return Err(AppError::BadRequest("No URL provided".to_string()));
    };

    tracing::info!("Fetching formats for URL: {}", url);

    let info = state
        .extractor
        .extract_info(&url)
        .await
        .map_err(|e| AppError::Extraction(e.to_string()))?;

    let formats = selector::list_best_formats(&info.formats);
    tracing::info!("Listing {} formats for '{}'", formats.len(), info.title);

    Ok((StatusCode::OK, Json(FormatList { formats })))
}

// ===================================================================
//                          DETAILS HANDLER
// ===================================================================

/// # POST /details - Returns title, thumbnail, channel and upload date.
///
/// Unlike the other two handlers this one has no error boundary: an absent
/// URL is passed through to the extractor as an empty string, and failures
/// surface as plain text without the JSON error envelope.
pub async fn video_details(
    State(state): State<AppState>,
    Json(payload): Json<DetailsRequest>,
) -> Response {
    match fetch_details(state.extractor.as_ref(), &payload.url).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn fetch_details(extractor: &dyn VideoExtractor, url: &str) -> anyhow::Result<VideoDetails> {
    let info = extractor.extract_info(url).await?;

    let timestamp = info
        .timestamp
        .ok_or_else(|| anyhow::anyhow!("no upload timestamp in metadata"))?;
    let uploaded = chrono::DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid upload timestamp: {timestamp}"))?
        .format("%d/%m/%Y")
        .to_string();

    Ok(VideoDetails {
        title: info.title,
        thumbnail: info.thumbnail.unwrap_or_default(),
        channel: info.channel.unwrap_or_default(),
        uploaded,
    })
}

// ===================================================================
//                          HELPER FUNCTIONS
// ===================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
