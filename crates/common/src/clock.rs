//! Clock scaling between the video frame clock and the audio sample clock.
//!
//! Strip timing is declared in video frames. The target timeline addresses
//! audio edits and automation in sample units, so every frame count written
//! into an audio track is multiplied by a fixed per-kind delta.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;

/// Kind of media a track (and every strip injected into it) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn is_audio(self) -> bool {
        self == Self::Audio
    }

    pub fn is_video(self) -> bool {
        self == Self::Video
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("AUDIO"),
            Self::Video => f.write_str("VIDEO"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUDIO" => Ok(Self::Audio),
            "VIDEO" => Ok(Self::Video),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

/// Converts frame counts into per-kind timeline units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockScale {
    /// Audio units per video frame.
    audio_delta: i64,
    /// Video units per video frame.
    video_delta: i64,
}

impl ClockScale {
    pub fn new(audio_delta: i64, video_delta: i64) -> Self {
        Self {
            audio_delta,
            video_delta,
        }
    }

    /// Units per frame for the given kind.
    pub fn delta(&self, kind: MediaKind) -> i64 {
        match kind {
            MediaKind::Audio => self.audio_delta,
            MediaKind::Video => self.video_delta,
        }
    }

    /// Scale a frame count (or frame position) into timeline units,
    /// saturating at the `i64` bounds.
    pub fn to_units(&self, kind: MediaKind, frames: i64) -> i64 {
        frames.saturating_mul(self.delta(kind))
    }
}

impl Default for ClockScale {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for ClockScale {
    fn from(timing: &TimingConfig) -> Self {
        Self::new(timing.audio_clock_delta, timing.video_clock_delta)
    }
}
