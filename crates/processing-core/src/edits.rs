//! Gap filling and edit emission.
//!
//! A channel's strips become a sequence of edit blocks. The target
//! timeline has no absolute positions for edits: each edit starts where
//! the previous one ended, so any temporal gap between two strips must be
//! covered by an explicit filler block.

use std::collections::HashMap;

use stripcut_common::clock::{ClockScale, MediaKind};
use stripcut_project_model::channel::Channel;
use stripcut_project_model::strip::{StripId, StripRecord};

/// One block of a track's edit list, in timeline units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditBlock {
    /// Empty edit covering time with no content.
    Filler { length: i64 },

    /// Edit playing a source clip.
    Content {
        source: String,
        start_source: i64,
        length: i64,
        /// Left/right audio channel of the source pair; 0 for video.
        audio_channel: u8,
        title: String,
    },
}

impl EditBlock {
    pub fn is_filler(&self) -> bool {
        matches!(self, Self::Filler { .. })
    }
}

/// Emits edit blocks for channels.
///
/// Holds a per-strip audio channel cursor: each emission of a strip into an
/// audio track takes the next side of its left/right pair.
#[derive(Debug, Clone)]
pub struct EditEmitter {
    scale: ClockScale,
    audio_cursors: HashMap<StripId, usize>,
}

impl EditEmitter {
    pub fn new(scale: ClockScale) -> Self {
        Self {
            scale,
            audio_cursors: HashMap::new(),
        }
    }

    /// Blocks for every strip of the channel, in order.
    pub fn emit_channel(&mut self, channel: &Channel) -> Vec<EditBlock> {
        channel
            .strips()
            .iter()
            .flat_map(|strip| self.emit_strip(channel, strip))
            .collect()
    }

    /// Blocks for one strip: an optional gap filler, then either its content
    /// or, when muted for the track kind, a filler of its own length.
    pub fn emit_strip(&mut self, channel: &Channel, strip: &StripRecord) -> Vec<EditBlock> {
        // Strips that were never assigned a track kind run on the audio clock.
        let kind = strip.kind.unwrap_or(MediaKind::Audio);
        let mut blocks = Vec::with_capacity(2);

        let left = channel.left_neighbor(strip.id);
        let left_end = left.map_or(0, StripRecord::frame_final_end);
        let left_fade_out = left.map_or(0, |l| l.fades.fade_out);

        if left_end != strip.frame_final_start {
            let mut gap = strip.frame_final_start - left_end;
            if kind.is_video() && strip.on_overlap_channel {
                gap += left_fade_out;
            }
            if gap < 0 {
                tracing::warn!(
                    channel = channel.id,
                    strip = %strip,
                    gap,
                    "strip overlaps its left neighbor; emitting negative filler"
                );
            }
            blocks.push(EditBlock::Filler {
                length: self.scale.to_units(kind, gap),
            });
        }

        if strip.is_muted_for(kind) {
            blocks.push(EditBlock::Filler {
                length: self.scale.to_units(kind, strip.duration()),
            });
            return blocks;
        }

        blocks.push(EditBlock::Content {
            source: strip.filepath.clone(),
            start_source: self.scale.to_units(kind, strip.offset),
            length: self.scale.to_units(kind, strip.duration()),
            audio_channel: self.next_audio_channel(strip, kind),
            title: strip.to_string(),
        });
        blocks
    }

    fn next_audio_channel(&mut self, strip: &StripRecord, kind: MediaKind) -> u8 {
        if kind.is_video() {
            return 0;
        }
        let cursor = self.audio_cursors.entry(strip.id).or_insert(0);
        let side = (*cursor % 2) as u8;
        *cursor += 1;
        side
    }
}

impl Default for EditEmitter {
    fn default() -> Self {
        Self::new(ClockScale::default())
    }
}
