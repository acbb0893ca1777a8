use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// The structure of our configuration file (config.toml).
///
/// Loaded once at startup and never mutated afterwards; every value here is
/// process-wide for the lifetime of the server.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// Scratch directory for transient download files. Files live here only
    /// for the seconds to minutes between download and cleanup.
    pub download_directory: String,
}

impl Default for Config {
    fn default() -> Self {
        // Transient files belong under the platform cache directory, with a
        // relative-path fallback when no home directory exists.
        let default_dir = project_dirs()
            .map(|dirs| dirs.cache_dir().join("downloads").to_string_lossy().to_string())
            .unwrap_or_else(|| "downloads".to_string());

        Config {
            download_directory: default_dir,
        }
    }
}

impl Config {
    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(&self.download_directory)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "VideoFetch", "videofetch")
}

/// Returns the cross-platform path to the configuration file, creating the directory if needed.
async fn get_config_path() -> Result<PathBuf> {
    let project_dirs =
        project_dirs().ok_or_else(|| anyhow!("Could not find a valid home directory to store config"))?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir).await?;

    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from the file, or creates a default one if it doesn't exist.
pub async fn load_config() -> Result<Config> {
    let config_path = get_config_path().await?;

    if !config_path.exists() {
        tracing::info!(
            "No config file found. Creating a default one at: {}",
            config_path.display()
        );
        let default_config = Config::default();
        save_config(&default_config).await?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path).await?;
    let config: Config = toml::from_str(&config_content)
        .map_err(|e| anyhow!("Failed to parse config file at {}: {}", config_path.display(), e))?;

    Ok(config)
}

/// Saves the provided configuration object to the file.
pub async fn save_config(config: &Config) -> Result<()> {
    let config_path = get_config_path().await?;
    let toml_string = toml::to_string_pretty(config)?;
    fs::write(config_path, toml_string).await?;
    Ok(())
}
