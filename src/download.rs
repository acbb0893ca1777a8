use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::extractor::VideoExtractor;

/// Pending scratch-file removals, keyed by path with the number of failed
/// attempts so far. Every scratch file is registered here before its cleanup
/// task starts and deregistered on every terminal outcome, so leaked files
/// are observable while the map itself stays bounded.
pub type CleanupState = Arc<Mutex<HashMap<PathBuf, u32>>>;

/// Delay between removal attempts. The first attempt also waits one interval,
/// which gives the response stream time to drain before the file goes away.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(4);

/// Removal attempts before a scratch file is written off as leaked.
const MAX_CLEANUP_ATTEMPTS: u32 = 15;

/// Downloads the resolved format spec into a fresh uniquely named scratch
/// file and returns its path.
pub async fn fetch(
    extractor: &dyn VideoExtractor,
    config: &Config,
    url: &str,
    format_spec: &str,
) -> Result<PathBuf, AppError> {
    let scratch_dir = config.download_dir();
    tokio::fs::create_dir_all(&scratch_dir).await?;

    // Uniqueness comes from the random id alone; no registry of names.
    let output_path = scratch_dir.join(format!("{}.mp4", Uuid::new_v4()));

    tracing::info!("Downloading format {} for {} to {}", format_spec, url, output_path.display());
    extractor
        .download(url, format_spec, &output_path)
        .await
        .map_err(|e| AppError::Extraction(e.to_string()))?;

    Ok(output_path)
}

/// Streams the scratch file back as a download attachment and schedules its
/// removal.
pub async fn serve_and_cleanup(cleanups: CleanupState, path: PathBuf) -> Result<Response, AppError> {
    let file = tokio::fs::File::open(&path).await?;
    let stream = tokio_util::io::ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_str(&disposition).unwrap());

    schedule_removal(cleanups, path);

    Ok((headers, body).into_response())
}

/// Registers the path and spawns the detached removal task.
pub fn schedule_removal(cleanups: CleanupState, path: PathBuf) {
    cleanups.lock().unwrap().insert(path.clone(), 0);
    tokio::spawn(retry_removal(cleanups, path, CLEANUP_INTERVAL));
}

/// Attempts removal on a fixed interval until it succeeds or the attempt
/// budget runs out. Failure is never surfaced to a client; exhaustion logs
/// the leaked path.
async fn retry_removal(cleanups: CleanupState, path: PathBuf, interval: Duration) {
    for attempt in 1..=MAX_CLEANUP_ATTEMPTS {
        tokio::time::sleep(interval).await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted temp file: {}", path.display());
                cleanups.lock().unwrap().remove(&path);
                return;
            }
            Err(e) => {
                tracing::warn!(
                    "Error deleting temp file {} (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    MAX_CLEANUP_ATTEMPTS,
                    e
                );
                if let Some(attempts) = cleanups.lock().unwrap().get_mut(&path) {
                    *attempts = attempt;
                }
            }
        }
    }

    tracing::error!(
        "Giving up on temp file after {} attempts, leaking: {}",
        MAX_CLEANUP_ATTEMPTS,
        path.display()
    );
    cleanups.lock().unwrap().remove(&path);
}
