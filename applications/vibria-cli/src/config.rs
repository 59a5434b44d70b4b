/// Player configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vibria_playback::PlaybackConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_progress_threshold_secs")]
    pub progress_threshold_secs: f64,

    #[serde(default = "default_max_progress_entries")]
    pub max_progress_entries: usize,

    #[serde(default = "default_playlist_debounce_ms")]
    pub playlist_debounce_ms: u64,

    #[serde(default = "default_library_debounce_ms")]
    pub library_debounce_ms: u64,

    #[serde(default = "default_overlay_min_visible_ms")]
    pub overlay_min_visible_ms: u64,

    #[serde(default = "default_max_user_playlists")]
    pub max_user_playlists: usize,

    /// Length of every track in the simulated engine
    #[serde(default = "default_simulated_track_secs")]
    pub simulated_track_secs: f64,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `vibria.toml` in the working
    /// directory is used if present. `VIBRIA_<SECTION>__<KEY>` variables
    /// override both, e.g. `VIBRIA_STORAGE__DATABASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!("{} does not exist", path.display())));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from("vibria.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("VIBRIA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.is_empty() {
            return Err(CliError::Config(
                "storage.database_url is required".to_string(),
            ));
        }

        let playback = &self.playback;
        if !playback.progress_threshold_secs.is_finite() || playback.progress_threshold_secs < 0.0 {
            return Err(CliError::Config(format!(
                "playback.progress_threshold_secs must be >= 0, got {}",
                playback.progress_threshold_secs
            )));
        }
        if playback.max_progress_entries == 0 || playback.max_user_playlists == 0 {
            return Err(CliError::Config(
                "playback limits must be at least 1".to_string(),
            ));
        }
        if !playback.simulated_track_secs.is_finite() || playback.simulated_track_secs <= 0.0 {
            return Err(CliError::Config(
                "playback.simulated_track_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Tunables for the playback manager
    pub fn playback_config(&self) -> PlaybackConfig {
        let playback = &self.playback;
        PlaybackConfig {
            progress_threshold_secs: playback.progress_threshold_secs,
            max_progress_entries: playback.max_progress_entries,
            playlist_debounce: Duration::from_millis(playback.playlist_debounce_ms),
            library_debounce: Duration::from_millis(playback.library_debounce_ms),
            overlay_min_visible: Duration::from_millis(playback.overlay_min_visible_ms),
            max_user_playlists: playback.max_user_playlists,
        }
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://vibria.db".to_string()
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        progress_threshold_secs: default_progress_threshold_secs(),
        max_progress_entries: default_max_progress_entries(),
        playlist_debounce_ms: default_playlist_debounce_ms(),
        library_debounce_ms: default_library_debounce_ms(),
        overlay_min_visible_ms: default_overlay_min_visible_ms(),
        max_user_playlists: default_max_user_playlists(),
        simulated_track_secs: default_simulated_track_secs(),
    }
}

fn default_progress_threshold_secs() -> f64 {
    5.0
}

fn default_max_progress_entries() -> usize {
    200
}

fn default_playlist_debounce_ms() -> u64 {
    600
}

fn default_library_debounce_ms() -> u64 {
    1000
}

fn default_overlay_min_visible_ms() -> u64 {
    1000
}

fn default_max_user_playlists() -> usize {
    10
}

fn default_simulated_track_secs() -> f64 {
    180.0
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            playback: default_playback(),
        }
    }
}
