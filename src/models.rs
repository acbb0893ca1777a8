use serde::{Deserialize, Serialize};

// === API Request Models ===

/// The JSON body for a `POST /download` request.
///
/// Both fields are optional at the serde level so the handler can report a
/// missing or empty value as a 400 instead of a framework rejection.
#[derive(Deserialize, Debug)]
pub struct DownloadRequest {
    pub url: Option<String>,
    pub format_id: Option<String>,
}

/// The JSON body for a `POST /formats` request.
#[derive(Deserialize, Debug)]
pub struct FormatsRequest {
    pub url: Option<String>,
}

/// The JSON body for a `POST /details` request.
///
/// Presence of `url` is deliberately not validated; an absent URL becomes the
/// empty string and fails inside the extractor call.
#[derive(Deserialize, Debug)]
pub struct DetailsRequest {
    #[serde(default)]
    pub url: String,
}

// === Extractor Output Models ===

/// Top-level JSON output from `yt-dlp --dump-json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VideoInfo {
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Upload time as a Unix timestamp.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// A single format descriptor as reported by yt-dlp.
///
/// `vcodec`/`acodec` carry the literal string "none" for an absent track; an
/// empty string means the extractor did not report the field at all.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: String,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub vcodec: String,
    #[serde(default)]
    pub acodec: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl RawFormat {
    pub fn has_audio(&self) -> bool {
        self.acodec != "none"
    }

    pub fn has_video(&self) -> bool {
        self.vcodec != "none"
    }

    /// True for pure audio tracks (video track explicitly reported absent).
    pub fn is_audio_only(&self) -> bool {
        self.vcodec == "none" && self.acodec != "none"
    }
}

// === API Response Models ===

/// One entry of the `/formats` listing: the best representative format for a
/// single resolution tier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormatOption {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub filesize_mb: f64,
    pub fps: Option<f64>,
    pub has_audio: bool,
    pub has_video: bool,
    pub height: Option<u32>,
}

/// The `/formats` response envelope.
#[derive(Serialize, Deserialize, Debug)]
pub struct FormatList {
    pub formats: Vec<FormatOption>,
}

/// The `/details` response body. `uploaded` is formatted day/month/year.
#[derive(Serialize, Deserialize, Debug)]
pub struct VideoDetails {
    pub title: String,
    pub thumbnail: String,
    pub channel: String,
    pub uploaded: String,
}
