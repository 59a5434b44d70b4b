//! Composition root: storage, file access, engine and manager

use crate::config::PlayerConfig;
use crate::engine::SimulatedEngine;
use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use vibria_core::{LocalFileAccess, PlaylistId, TrackRef};
use vibria_playback::PlaybackManager;
use vibria_storage::SqliteStore;

/// Open the database and build a manager with the restored session
pub async fn open_player(config: &PlayerConfig) -> Result<PlaybackManager> {
    let pool = vibria_storage::create_pool(&config.storage.database_url)
        .await
        .map_err(|e| CliError::Config(format!("cannot open {}: {e}", config.storage.database_url)))?;
    vibria_storage::run_migrations(&pool).await?;
    info!("Database ready at {}", config.storage.database_url);

    let mut manager = PlaybackManager::open(
        Box::new(SimulatedEngine::new(config.playback.simulated_track_secs)),
        Arc::new(LocalFileAccess::new()),
        Arc::new(SqliteStore::new(pool)),
        config.playback_config(),
    )
    .await?;
    manager.restore_session().await?;
    Ok(manager)
}

/// Persist pending saves and silence the engine before exiting
pub async fn shutdown(manager: &mut PlaybackManager) -> Result<()> {
    manager.flush_pending_saves().await?;
    manager.hard_stop_and_silence();
    Ok(())
}

/// Resolve a playlist by case-insensitive name
pub fn playlist_id(manager: &PlaybackManager, name: &str) -> Result<PlaylistId> {
    manager
        .playlists()
        .find_by_name(name)
        .map(|playlist| playlist.id)
        .ok_or_else(|| CliError::UnknownPlaylist(name.to_string()))
}

/// Track reference for a command-line path, relative to the working directory
pub fn track_arg(path: &Path) -> Result<TrackRef> {
    Ok(TrackRef::new(std::env::current_dir()?.join(path)))
}

/// Expand files and directories (recursively) into track references
///
/// Paths are made absolute so the stored library does not depend on the
/// working directory. Directory entries are sorted for a stable order.
pub fn collect_tracks(paths: &[PathBuf]) -> Result<Vec<TrackRef>> {
    let mut tracks = Vec::new();
    let cwd = std::env::current_dir()?;
    for path in paths {
        collect_into(&cwd.join(path), &mut tracks)?;
    }
    debug!("Collected {} files", tracks.len());
    Ok(tracks)
}

fn collect_into(path: &Path, tracks: &mut Vec<TrackRef>) -> Result<()> {
    if !path.is_dir() {
        tracks.push(TrackRef::new(path));
        return Ok(());
    }

    let mut entries = std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    for entry in entries {
        collect_into(&entry, tracks)?;
    }
    Ok(())
}
