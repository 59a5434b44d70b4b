/// Domain types for Vibria
mod playback;
mod playlist;
mod track;

pub use playback::{LoopMode, NowPlaying};
pub use playlist::{Playlist, PlaylistId};
pub use track::{partition_supported, TrackRef, SUPPORTED_EXTENSIONS};
