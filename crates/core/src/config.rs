use serde::{Deserialize, Serialize};
use staffplay_engine::{DEFAULT_SOUND_FONT, EngineOptions};
use staffplay_transport::{A440_CENTS, TransportState};
use std::fs;
use std::path::{Path, PathBuf};

/// Player settings read from `<config dir>/staffplay/config.toml`.
///
/// Every field is optional in the file. The file is only ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Voice bank the engine downloads for synthesis.
    pub sound_font: String,
    /// Let the engine scroll the score surface to follow playback.
    pub scroll_to_surface: bool,
    pub default_master_volume: f32,
    pub default_tune_cents: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sound_font: DEFAULT_SOUND_FONT.to_string(),
            scroll_to_surface: true,
            default_master_volume: 1.0,
            default_tune_cents: A440_CENTS,
        }
    }
}

impl PlayerConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("staffplay").join("config.toml"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Read a config file, falling back to defaults when it is missing or
    /// malformed.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };

        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(target: "session", "ignoring malformed config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            sound_font: self.sound_font.clone(),
            scroll_to_surface: self.scroll_to_surface,
        }
    }

    /// Transport settings every new load starts from.
    pub fn default_transport(&self) -> TransportState {
        TransportState::new(self.default_master_volume, self.default_tune_cents)
    }
}
