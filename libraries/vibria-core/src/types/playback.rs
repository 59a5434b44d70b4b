/// Playback mode types
use serde::{Deserialize, Serialize};

/// Loop mode
///
/// Persisted as an integer: off = 0, single = 1, all = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum LoopMode {
    /// Stop after the last track of the queue
    #[default]
    Off,
    /// Repeat the current track
    Single,
    /// Wrap to the start of the queue
    All,
}

impl LoopMode {
    /// Next mode in the cycle off -> single -> all -> off
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::Single,
            Self::Single => Self::All,
            Self::All => Self::Off,
        }
    }

    /// Integer representation used in storage
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Single => 1,
            Self::All => 2,
        }
    }
}

impl From<LoopMode> for i64 {
    fn from(mode: LoopMode) -> Self {
        mode.as_i64()
    }
}

impl TryFrom<i64> for LoopMode {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Single),
            2 => Ok(Self::All),
            other => Err(format!("invalid loop mode: {other}")),
        }
    }
}

/// Metadata published to the platform's now-playing surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    /// Track title
    pub title: String,
    /// Elapsed seconds
    pub elapsed: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Playback rate (0.0 paused, 1.0 playing)
    pub rate: f64,
}
