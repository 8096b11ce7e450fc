//! Player configuration for skiff-player
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/skiff-player/config.yaml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Path to the looping music stream
    pub music_path: PathBuf,
    /// Named one-shot event sounds, fired on a timer while playing
    pub event_sounds: Vec<EventSoundConfig>,
    /// Starting music volume (0..1)
    pub volume: f32,
    /// Update ticks per second for the command loop
    pub tick_rate: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let music_path = dirs::audio_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skiff")
            .join("music.mp3");

        Self {
            music_path,
            event_sounds: Vec::new(),
            volume: 1.0,
            tick_rate: 60,
        }
    }
}

/// One named event sound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSoundConfig {
    pub name: String,
    pub path: PathBuf,
}

/// Get the default config file path
///
/// Returns: ~/.config/skiff-player/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("skiff-player")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> PlayerConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, writing defaults");
        let config = PlayerConfig::default();
        if let Err(e) = save_config(&config, path) {
            log::warn!("load_config: Failed to write default config: {}", e);
        }
        return config;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<PlayerConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: Loaded config - music: {:?}, {} event sounds",
                    config.music_path,
                    config.event_sounds.len()
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                PlayerConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            PlayerConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &PlayerConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}
