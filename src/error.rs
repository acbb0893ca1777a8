use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

// Define our custom error type
pub enum AppError {
    Internal(anyhow::Error),
    /// yt-dlp failed during metadata extraction or download; carries the
    /// underlying error text verbatim.
    Extraction(String),
    BadRequest(String),
    InvalidFormat,
    NoSuitableAudio,
}

// This implementation allows us to convert our AppError into a valid HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(e) => {
                // Log the full error for debugging
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Extraction(e) => {
                tracing::error!("Extraction failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e)
            }
            AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, e),
            AppError::InvalidFormat => {
                (StatusCode::BAD_REQUEST, "Invalid format_id".to_string())
            }
            // Kept at 500 for compatibility with the original API surface,
            // even though the cause is an unresolvable client request.
            AppError::NoSuitableAudio => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "No suitable audio format found".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// This allows us to use the `?` operator to automatically convert
// any error that implements `std::error::Error` into our `AppError::Internal`.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal({e:?})"),
            AppError::Extraction(e) => write!(f, "Extraction({e})"),
            AppError::BadRequest(e) => write!(f, "BadRequest({e})"),
            AppError::InvalidFormat => write!(f, "InvalidFormat"),
            AppError::NoSuitableAudio => write!(f, "NoSuitableAudio"),
        }
    }
}
