use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use crate::models::VideoInfo;

/// The extraction backend the handlers talk to.
///
/// Everything that touches the network lives behind this trait, so the
/// selector and the HTTP layer can be exercised with a stub in tests.
#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Fetches the metadata record for a video URL, including the full list
    /// of available formats, without downloading anything.
    async fn extract_info(&self, url: &str) -> Result<VideoInfo>;

    /// Downloads the given format spec (a format id, or "video+audio") to
    /// `output`, muxed into a single mp4 file.
    async fn download(&self, url: &str, format_spec: &str, output: &Path) -> Result<()>;
}

/// Production backend: shells out to the yt-dlp executable on PATH.
pub struct YtDlp;

#[async_trait]
impl VideoExtractor for YtDlp {
    async fn extract_info(&self, url: &str) -> Result<VideoInfo> {
        let output = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let error_message = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(anyhow!(error_message));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    async fn download(&self, url: &str, format_spec: &str, output: &Path) -> Result<()> {
        let result = Command::new("yt-dlp")
            .arg("-f")
            .arg(format_spec)
            .arg("-o")
            .arg(output)
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("--quiet")
            .arg(url)
            .output()
            .await?;

        if !result.status.success() {
            let error_message = String::from_utf8_lossy(&result.stderr).to_string();
            return Err(anyhow!(error_message));
        }

        Ok(())
    }
}
