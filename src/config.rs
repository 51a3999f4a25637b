use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Default music directory (used when a command has no path argument).
    pub music_dir: Option<PathBuf>,
    /// Genre rule thresholds (merged over the built-in defaults).
    pub genre: GenreThresholds,
}

/// Cutoffs for the genre rule table.
///
/// The values are heuristic constants carried over from the original tuning;
/// they are configurable but the defaults should not be changed casually.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenreThresholds {
    /// Rule 1: tempo above this AND energy above `club_energy` → Electronic/Club
    pub club_tempo: f64,
    pub club_energy: f64,
    /// Rule 2: tempo below this AND energy below `chill_energy` → Chill/Hip-hop
    pub chill_tempo: f64,
    pub chill_energy: f64,
    /// Rule 3: tempo inside [low, high] → Pop/Indie
    pub pop_tempo_low: f64,
    pub pop_tempo_high: f64,
}

impl Default for GenreThresholds {
    fn default() -> Self {
        Self {
            club_tempo: 130.0,
            club_energy: 0.03,
            chill_tempo: 90.0,
            chill_energy: 0.02,
            pop_tempo_low: 90.0,
            pop_tempo_high: 120.0,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/cuematch/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
