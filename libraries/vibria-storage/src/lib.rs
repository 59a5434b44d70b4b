//! Vibria Storage
//!
//! Persistence layer for the Vibria player.
//!
//! All state lives in a flat key-value store with JSON values (see
//! [`store`] for the keys). On top of it this crate provides:
//!
//! - **Library bookmarks**: access tokens for every imported track
//! - **Playlists**: CRUD, Favorites, debounced saves with a user playlist cap
//! - **Progress**: per-track resume positions with a write threshold and LRU cap
//! - **Last played**: the track and position to resume at launch
//! - **Preferences**: resume flags, shuffle and loop mode
//! - **Saving indicator**: a reference-counted overlay with minimum dwell
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vibria_storage::{create_pool, run_migrations, SqliteStore, ProgressStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://vibria.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = Arc::new(SqliteStore::new(pool));
//! let mut progress = ProgressStore::new(store);
//! progress.save_if_needed("intro.mp3", 42.0).await?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod bookmarks;
pub mod debounce;
pub mod last_played;
pub mod overlay;
pub mod playlists;
pub mod preferences;
pub mod progress;
pub mod store;

pub use bookmarks::BookmarkStore;
pub use debounce::DebouncedWriter;
pub use error::StorageError;
pub use last_played::LastPlayedStore;
pub use overlay::OverlayCoordinator;
pub use playlists::{PlaylistError, PlaylistSettings, PlaylistStore, FAVORITES_DEFAULT_NAME};
pub use preferences::Preferences;
pub use progress::ProgressStore;
pub use store::{MemoryStore, SqliteStore};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before handing the pool to [`SqliteStore`].
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://vibria.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!("Creating pool with URL: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    // In-memory databases are per connection, so keep exactly one
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}
