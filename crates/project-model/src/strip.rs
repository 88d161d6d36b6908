//! Placed strip records.
//!
//! A [`StripRecord`] is built once per declared clip by the placement pass.
//! After that it is read-only, except for the media kind, which is only
//! known once the record is injected into a typed track.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stripcut_common::clock::MediaKind;

/// Declaration-order index of a strip within one compilation.
pub type StripId = usize;

/// Integer position or length on the video frame clock.
pub type Frame = i64;

/// Flags suppressing emitted content for a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripFlag {
    /// Drop audio content and all volume automation.
    #[serde(alias = "mute_sound")]
    MuteAudio,
    /// Drop video content, keeping the timeline length with a filler.
    #[serde(alias = "mute_movie")]
    MuteVideo,
    /// Only meaningful to the live host-editor front-end.
    #[serde(alias = "mute_blender")]
    MuteInHost,
}

/// A volume value in an explicit automation override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum VolumeValue {
    /// `D`: the strip's nominal volume.
    Nominal,
    /// `FM`: the global fade-minimum floor.
    FadeMin,
    /// A literal volume.
    Literal(f64),
}

impl VolumeValue {
    /// Resolve against the strip's nominal volume and the fade floor.
    pub fn resolve(self, nominal: f64, fade_min: f64) -> f64 {
        match self {
            Self::Nominal => nominal,
            Self::FadeMin => fade_min,
            Self::Literal(v) => v,
        }
    }
}

impl TryFrom<serde_json::Value> for VolumeValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Literal)
                .ok_or_else(|| format!("volume out of range: {n}")),
            serde_json::Value::String(s) => match s.as_str() {
                "D" => Ok(Self::Nominal),
                "FM" => Ok(Self::FadeMin),
                other => other
                    .parse::<f64>()
                    .map(Self::Literal)
                    .map_err(|_| format!("unknown volume constant: {other}")),
            },
            other => Err(format!("expected a number, \"D\" or \"FM\", got {other}")),
        }
    }
}

impl From<VolumeValue> for serde_json::Value {
    fn from(value: VolumeValue) -> Self {
        match value {
            VolumeValue::Nominal => Self::from("D"),
            VolumeValue::FadeMin => Self::from("FM"),
            VolumeValue::Literal(v) => Self::from(v),
        }
    }
}

/// Resolved fade lengths and optional interior ramp offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fades {
    pub fade_in: Frame,
    pub fade_out: Frame,
    /// Hold at the floor for this long after the strip start before ramping in.
    pub fade_in_position: Option<Frame>,
    /// Offset of the fade-out ramp from the strip end.
    pub fade_out_position: Option<Frame>,
}

impl Fades {
    /// Build from the `[in, out, in_position, out_position]` form.
    /// A zero position means "ramp at the clip edge".
    pub fn from_array(values: [Frame; 4]) -> Self {
        let [fade_in, fade_out, in_pos, out_pos] = values;
        Self {
            fade_in,
            fade_out,
            fade_in_position: (in_pos != 0).then_some(in_pos),
            fade_out_position: (out_pos != 0).then_some(out_pos),
        }
    }
}

/// The placed instance of one declared clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripRecord {
    pub id: StripId,

    /// Clip source path, also the key into the global volume table.
    pub filepath: String,

    /// Kind of the track the strip was last injected into.
    pub kind: Option<MediaKind>,

    /// Resolved channel (track) id.
    pub channel: i64,

    /// Whether `channel` is the overlap channel, where video fade-outs
    /// run under the next clip.
    pub on_overlap_channel: bool,

    /// Trim-in point into the source clip.
    pub offset: Frame,

    /// Nominal length before fade adjustment.
    pub raw_duration: Frame,

    /// Offset from the anchor's end.
    pub position: Frame,

    /// Absolute start on the timeline.
    pub frame_final_start: Frame,

    pub fades: Fades,

    /// Dip-and-recover windows relative to `frame_final_start`.
    pub mutes: Vec<(Frame, Frame)>,

    /// Explicit automation overrides relative to `frame_final_start`.
    pub volume_levels: Vec<(Frame, VolumeValue)>,

    pub flags: BTreeSet<StripFlag>,

    /// Nominal volume from the global table.
    pub volume: f64,
}

impl StripRecord {
    /// Visible length. Video on the overlap channel gives up its fade-out,
    /// which is covered by the following clip instead.
    pub fn duration(&self) -> Frame {
        if self.is_video() && self.on_overlap_channel {
            self.raw_duration - self.fades.fade_out
        } else {
            self.raw_duration
        }
    }

    /// Absolute end on the timeline. Always `frame_final_start + duration()`.
    pub fn frame_final_end(&self) -> Frame {
        self.frame_final_start + self.duration()
    }

    pub fn is_audio(&self) -> bool {
        self.kind == Some(MediaKind::Audio)
    }

    pub fn is_video(&self) -> bool {
        self.kind == Some(MediaKind::Video)
    }

    pub fn set_kind(&mut self, kind: MediaKind) {
        self.kind = Some(kind);
    }

    pub fn has_flag(&self, flag: StripFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether content of the given kind is suppressed for this strip.
    pub fn is_muted_for(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.has_flag(StripFlag::MuteAudio),
            MediaKind::Video => self.has_flag(StripFlag::MuteVideo),
        }
    }

    /// File name component of the source path.
    pub fn file_name(&self) -> &str {
        Path::new(&self.filepath)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.filepath)
    }
}

impl fmt::Display for StripRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.file_name(), self.duration())
    }
}
