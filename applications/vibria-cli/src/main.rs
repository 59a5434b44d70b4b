/// Vibria - headless local music player
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibria_cli::app::{collect_tracks, open_player, playlist_id, shutdown, track_arg};
use vibria_cli::PlayerConfig;
use vibria_core::LoopMode;
use vibria_playback::{PlaybackManager, PlayerEvent};

#[derive(Parser)]
#[command(name = "vibria")]
#[command(about = "Vibria local music player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "VIBRIA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add files or directories to the library
    Import {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List the library
    Library,
    /// Remove a track from the library and every playlist
    Remove {
        path: PathBuf,
    },
    /// Manage playlists
    Playlist {
        #[command(subcommand)]
        command: PlaylistCommands,
    },
    /// Toggle a track in Favorites
    Favorite {
        path: PathBuf,
    },
    /// Show the restored session
    Status,
    /// Play for a while, printing progress
    Play {
        /// Track to start with (defaults to the restored selection)
        #[arg(short, long)]
        track: Option<PathBuf>,
        /// Position to start at
        #[arg(long)]
        at: Option<f64>,
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        seconds: Option<u64>,
    },
    /// Turn shuffle on or off
    Shuffle {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Set the loop mode
    Loop {
        #[arg(value_enum)]
        mode: LoopArg,
    },
    /// Set launch resume preferences
    Resume {
        /// Reopen the last selected playlist
        #[arg(long)]
        playlist: Option<bool>,
        /// Reload the last played track at its position
        #[arg(long)]
        playback: Option<bool>,
    },
    /// Forget every playlist, bookmark and saved position
    Reset,
}

#[derive(Subcommand)]
enum PlaylistCommands {
    /// List playlists
    List,
    /// Create an empty playlist
    Create { name: String },
    /// Delete a playlist
    Delete { name: String },
    /// Play from a playlist; without a name, play from the library
    Select { name: Option<String> },
    /// Select Favorites
    Favorites,
    /// Select the next playlist
    Next,
    /// Select the previous playlist
    Prev,
    /// Add a track to a playlist
    Add { name: String, path: PathBuf },
    /// Remove a track from a playlist
    Drop { name: String, path: PathBuf },
    /// Move a song within a playlist
    Move { name: String, from: usize, to: usize },
    /// Write playlists now, dropping the oldest over the limit
    Save,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum LoopArg {
    Off,
    Single,
    All,
}

impl From<LoopArg> for LoopMode {
    fn from(arg: LoopArg) -> Self {
        match arg {
            LoopArg::Off => LoopMode::Off,
            LoopArg::Single => LoopMode::Single,
            LoopArg::All => LoopMode::All,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibria=info,vibria_playback=info,vibria_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = PlayerConfig::load(cli.config.as_deref())?;
    let mut manager = open_player(&config).await?;

    let result = run(&mut manager, cli.command).await;
    shutdown(&mut manager).await?;
    result
}

async fn run(manager: &mut PlaybackManager, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Import { paths } => {
            let mut events = manager.subscribe();
            let added = manager.import_tracks(collect_tracks(&paths)?).await?;
            while let Ok(event) = events.try_recv() {
                if let PlayerEvent::UnsupportedFiles { tracks } = event {
                    for track in tracks {
                        println!("skipped (unsupported): {track}");
                    }
                }
            }
            println!("{added} new tracks, {} in library", manager.library().len());
        }
        Commands::Library => print_library(manager),
        Commands::Remove { path } => {
            manager.remove_track(&track_arg(&path)?);
            println!("{} tracks in library", manager.library().len());
        }
        Commands::Playlist { command } => run_playlist(manager, command).await?,
        Commands::Favorite { path } => {
            let favorite = manager.toggle_favorite(track_arg(&path)?).await?;
            let verb = if favorite { "added to" } else { "removed from" };
            println!("{} {verb} Favorites", path.display());
        }
        Commands::Status => print_status(manager),
        Commands::Play { track, at, seconds } => play(manager, track, at, seconds).await?,
        Commands::Shuffle { state } => {
            manager.set_shuffle(matches!(state, Toggle::On)).await?;
            println!("shuffle: {}", manager.is_shuffling());
        }
        Commands::Loop { mode } => {
            manager.set_loop_mode(mode.into()).await?;
            println!("loop: {:?}", manager.loop_mode());
        }
        Commands::Resume { playlist, playback } => {
            let preferences = manager.preferences().clone();
            if let Some(enabled) = playlist {
                preferences.set_resume_last_playlist(enabled).await?;
            }
            if let Some(enabled) = playback {
                preferences.set_resume_playback(enabled).await?;
            }
            println!(
                "resume playlist: {}, resume playback: {}",
                preferences.resume_last_playlist().await?,
                preferences.resume_playback().await?
            );
        }
        Commands::Reset => {
            manager.reset_all().await?;
            println!("All player state cleared");
        }
    }
    Ok(())
}

async fn run_playlist(manager: &mut PlaybackManager, command: PlaylistCommands) -> anyhow::Result<()> {
    match command {
        PlaylistCommands::List => {
            let current = manager.playlists().current_id();
            let favorites = manager.playlists().favorites().map(|p| p.id);
            for playlist in manager.playlists().playlists() {
                let marker = if Some(playlist.id) == current { "*" } else { " " };
                let kind = if Some(playlist.id) == favorites { " (favorites)" } else { "" };
                println!("{marker} {}{kind}: {} songs", playlist.name, playlist.songs.len());
            }
        }
        PlaylistCommands::Create { name } => {
            let playlist = manager.create_playlist(&name).await?;
            println!("created {} ({})", playlist.name, playlist.id);
        }
        PlaylistCommands::Delete { name } => {
            let id = playlist_id(manager, &name)?;
            let removed = manager.delete_playlist(id).await?;
            println!("deleted {}", removed.name);
        }
        PlaylistCommands::Select { name } => {
            let id = name.map(|name| playlist_id(manager, &name)).transpose()?;
            manager.select_playlist(id).await?;
            print_queue(manager);
        }
        PlaylistCommands::Favorites => {
            manager.select_favorites().await?;
            print_queue(manager);
        }
        PlaylistCommands::Next => {
            manager.select_next_playlist().await?;
            print_queue(manager);
        }
        PlaylistCommands::Prev => {
            manager.select_previous_playlist().await?;
            print_queue(manager);
        }
        PlaylistCommands::Add { name, path } => {
            let id = playlist_id(manager, &name)?;
            if !manager.add_to_playlist(id, track_arg(&path)?)? {
                println!("{} is already in {name}", path.display());
            }
        }
        PlaylistCommands::Drop { name, path } => {
            let id = playlist_id(manager, &name)?;
            if !manager.remove_from_playlist(id, &track_arg(&path)?)? {
                println!("{} is not in {name}", path.display());
            }
        }
        PlaylistCommands::Move { name, from, to } => {
            let id = playlist_id(manager, &name)?;
            manager.move_in_playlist(id, from, to)?;
        }
        PlaylistCommands::Save => {
            manager.save_playlists_now().await?;
            println!("{} playlists saved", manager.playlists().playlists().len());
        }
    }
    Ok(())
}

async fn play(
    manager: &mut PlaybackManager,
    track: Option<PathBuf>,
    at: Option<f64>,
    seconds: Option<u64>,
) -> anyhow::Result<()> {
    match track {
        Some(path) => {
            manager.select(track_arg(&path)?)?;
            if let Some(at) = at {
                manager.seek(at)?;
            }
        }
        None => manager.play()?,
    }

    let mut events = manager.subscribe();
    let limit = async move {
        match seconds {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(limit, ctrl_c);

    loop {
        tokio::select! {
            Some(event) = manager.next_engine_event() => {
                manager.handle_engine_event(event).await?;
            }
            _ = &mut limit => break,
            _ = &mut ctrl_c => break,
        }

        while let Ok(event) = events.try_recv() {
            match event {
                PlayerEvent::SelectedTrackChanged { track: Some(track) } => {
                    println!("> {}", track.title());
                }
                PlayerEvent::PositionChanged { elapsed, duration } => {
                    println!("  {elapsed:>6.1}s / {duration:.1}s");
                }
                PlayerEvent::StateChanged { is_playing: false } if !manager.is_playing() => {
                    println!("  paused");
                }
                PlayerEvent::TrackUnavailable { track } => {
                    println!("  unavailable: {track}");
                }
                _ => {}
            }
        }
    }

    manager.pause();
    Ok(())
}

fn print_library(manager: &PlaybackManager) {
    let selected = manager.selected();
    for track in manager.library() {
        let marker = if Some(track) == selected { "*" } else { " " };
        println!("{marker} {track}");
    }
    println!("{} tracks", manager.library().len());
}

fn print_queue(manager: &PlaybackManager) {
    let source = manager
        .playlists()
        .current()
        .map_or_else(|| "library".to_string(), |p| p.name.clone());
    println!("queue from {source}: {} tracks", manager.active_queue().len());
    if let Some(track) = manager.selected() {
        println!("selected: {}", track.title());
    }
}

fn print_status(manager: &PlaybackManager) {
    let snapshot = manager.snapshot();
    match &snapshot.selected {
        Some(track) => println!(
            "{} at {:.1}s{}",
            track,
            snapshot.elapsed,
            if snapshot.is_playing { " (playing)" } else { "" }
        ),
        None => println!("nothing selected"),
    }
    print_queue(manager);
    println!(
        "shuffle: {}, loop: {:?}, library: {} tracks, playlists: {}",
        snapshot.is_shuffling,
        snapshot.loop_mode,
        manager.library().len(),
        manager.playlists().playlists().len()
    );
}
