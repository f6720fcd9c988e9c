//! Host settings with persistence
//!
//! Settings are read from the path given on the command line, else from
//! `~/.config/phage/settings.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use phage_game::GameConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Everything the demo host can be configured with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Number of host frames to simulate
    pub frames: u32,
    /// Raw delta fed per host frame (seconds)
    pub frame_delta: f32,
    /// Directory assets are read from
    pub assets_dir: Option<PathBuf>,
    /// The game itself
    pub game: GameConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            frames: 120,
            frame_delta: 1.0 / 60.0,
            assets_dir: None,
            game: GameConfig {
                title: "phage demo".to_string(),
                system_order: vec!["physics".to_string(), "render".to_string()],
                ..GameConfig::default()
            },
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("phage"))
    }

    /// The file settings are read from when no path is given
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from `path` (or the default location), falling back to
    /// defaults when the file is absent or broken
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    warn!("Could not determine config directory");
                    return Self::default();
                }
            },
        };

        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Write these settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}
