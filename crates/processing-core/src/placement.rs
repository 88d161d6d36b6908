//! Strip-tree placement.
//!
//! Walks the declared strip tree once, in pre-order, and turns every node
//! that references media into a [`StripRecord`] on its channel.
//!
//! # Anchoring
//!
//! Every strip is placed relative to an *anchor*: the previously placed
//! sibling, or the enclosing strip for the first child of a subtree, or
//! nothing at the root (end = 0). Siblings therefore play back to back,
//! and children start from their enclosing strip's end.
//!
//! ```text
//! a ────────┐
//!           b ──────┐              first child of a: anchored to a
//!                   c ───┐         child of b: anchored to b
//!                   d ─────┐       next sibling of b: also anchored to b
//! ```
//!
//! With a two-element timing tuple the position defaults to `-fade_in`,
//! so a strip overlaps its anchor by exactly its fade-in.

use std::collections::BTreeSet;

use stripcut_common::config::{ChannelConfig, CompilerConfig};
use stripcut_project_model::channel::{Channel, Channels};
use stripcut_project_model::declaration::{DescriptionError, StripDecl, StripDescription};
use stripcut_project_model::strip::{Fades, Frame, StripId, StripRecord};

/// The result of one placement pass: every record, owned by its channel.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    pub channels: Channels,
    next_id: StripId,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, id: i64) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn channel_mut(&mut self, id: i64) -> Option<&mut Channel> {
        self.channels.get_mut(id)
    }

    /// Every placed record, in declaration order.
    pub fn records(&self) -> Vec<&StripRecord> {
        self.channels.records()
    }

    pub fn strip_count(&self) -> usize {
        self.channels.strip_count()
    }

    fn allocate_id(&mut self) -> StripId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// The channel and end frame a strip is placed after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    channel: i64,
    end: Frame,
}

/// Builds a [`Compilation`] from a strip description.
pub struct PlacementEngine {
    channels: ChannelConfig,
    default_volume: f64,
}

impl PlacementEngine {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            channels: config.channels.clone(),
            default_volume: config.timing.default_volume,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&CompilerConfig::default())
    }

    /// Place every strip of the description.
    pub fn place(&self, description: &StripDescription) -> Result<Compilation, DescriptionError> {
        let mut compilation = Compilation::new();
        self.place_siblings(&mut compilation, description, &description.strips, None)?;
        tracing::debug!(
            strips = compilation.strip_count(),
            channels = compilation.channels.iter().count(),
            "placement complete"
        );
        Ok(compilation)
    }

    fn place_siblings(
        &self,
        compilation: &mut Compilation,
        description: &StripDescription,
        siblings: &[StripDecl],
        parent: Option<Anchor>,
    ) -> Result<(), DescriptionError> {
        let mut anchor = parent;

        for (index, decl) in siblings.iter().enumerate() {
            let Some(filepath) = decl.filepath.as_deref() else {
                continue;
            };

            let fades = Self::resolve_fades(siblings, index);
            let channel = self.resolve_channel(decl, anchor);
            let timing = decl.timing(fades.fade_in)?;
            let anchor_end = anchor.map_or(0, |a| a.end);

            let mut flags: BTreeSet<_> = decl.flags.iter().copied().collect();
            flags.extend(description.default_flags_for(filepath).iter().copied());

            let record = StripRecord {
                id: compilation.allocate_id(),
                filepath: filepath.to_string(),
                kind: None,
                channel,
                on_overlap_channel: channel == self.channels.overlap,
                offset: timing.offset,
                raw_duration: timing.duration,
                position: timing.position,
                frame_final_start: anchor_end + timing.position,
                fades,
                mutes: decl.mutes.clone(),
                volume_levels: decl.volume_levels.clone(),
                flags,
                volume: description.volume_for(filepath, self.default_volume),
            };

            tracing::debug!(
                id = record.id,
                channel,
                start = record.frame_final_start,
                end = record.frame_final_end(),
                strip = %record,
                "placed strip"
            );

            let placed = Anchor {
                channel,
                end: record.frame_final_end(),
            };
            compilation.channels.assign(record);

            self.place_siblings(compilation, description, &decl.strips, Some(placed))?;
            anchor = Some(placed);
        }

        Ok(())
    }

    /// Explicit fades win. Otherwise the previous sibling's crossfade becomes
    /// the fade-in and the next sibling's crossfade the fade-out.
    fn resolve_fades(siblings: &[StripDecl], index: usize) -> Fades {
        if let Some(fades) = siblings[index].declared_fades() {
            return fades;
        }
        let crossfade_at = |i: Option<usize>| {
            i.and_then(|i| siblings.get(i))
                .and_then(|s| s.crossfade)
                .unwrap_or(0)
        };
        Fades {
            fade_in: crossfade_at(index.checked_sub(1)),
            fade_out: crossfade_at(index.checked_add(1)),
            ..Fades::default()
        }
    }

    /// A declared channel is divided down to the target's track id. An
    /// undeclared one alternates away from the anchor's channel.
    fn resolve_channel(&self, decl: &StripDecl, anchor: Option<Anchor>) -> i64 {
        let declared = decl.channel.unwrap_or(0) / self.channels.declared_divisor;
        if declared != 0 {
            return declared;
        }
        match anchor.map(|a| a.channel) {
            Some(c) if c == self.channels.primary => self.channels.overlap,
            Some(c) if c == self.channels.overlap => self.channels.primary,
            _ => self.channels.primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stripcut_common::clock::MediaKind;
    use stripcut_project_model::strip::StripFlag;

    fn place(json: &str) -> Compilation {
        let description = StripDescription::parse(json).unwrap();
        PlacementEngine::with_defaults().place(&description).unwrap()
    }

    fn starts_and_channels(compilation: &Compilation) -> Vec<(i64, Frame, Frame)> {
        compilation
            .records()
            .iter()
            .map(|s| (s.channel, s.frame_final_start, s.frame_final_end()))
            .collect()
    }

    #[test]
    fn test_single_root_strip() {
        let compilation = place(r#"[{"filepath": "a.mp4", "offset_duration_position": [0, 100, 0]}]"#);
        assert_eq!(starts_and_channels(&compilation), vec![(2, 0, 100)]);
    }

    #[test]
    fn test_siblings_play_back_to_back_and_alternate() {
        let compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 100, 0]},
                {"filepath": "b.mp4", "offset_duration_position": [0, 50, 10]},
                {"filepath": "c.mp4", "offset_duration_position": [0, 30, 0]}
            ]"#,
        );
        assert_eq!(
            starts_and_channels(&compilation),
            vec![(2, 0, 100), (3, 110, 160), (2, 160, 190)]
        );
    }

    #[test]
    fn test_children_anchor_to_parent_end() {
        let compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 100, 0], "strips": [
                    {"filepath": "b.mp4", "offset_duration_position": [0, 40, 0]},
                    {"filepath": "c.mp4", "offset_duration_position": [0, 20, 0]}
                ]},
                {"filepath": "d.mp4", "offset_duration_position": [0, 10, 0]}
            ]"#,
        );
        // d follows a, not c: the subtree does not move the sibling anchor.
        assert_eq!(
            starts_and_channels(&compilation),
            vec![(2, 0, 100), (3, 100, 140), (2, 140, 160), (3, 100, 110)]
        );
    }

    #[test]
    fn test_organizational_nodes_are_skipped_with_children() {
        let compilation = place(
            r#"[
                {"title": "act one", "strips": [{"filepath": "hidden.mp4", "offset_duration_position": [0, 5]}]},
                {"filepath": "a.mp4", "offset_duration_position": [0, 100, 0]}
            ]"#,
        );
        assert_eq!(compilation.strip_count(), 1);
        assert_eq!(compilation.records()[0].filepath, "a.mp4");
        assert_eq!(compilation.records()[0].id, 0);
    }

    #[test]
    fn test_crossfade_inherited_from_siblings() {
        let compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 100], "crossfade": 8},
                {"filepath": "b.mp4", "offset_duration_position": [0, 100], "crossfade": 20},
                {"filepath": "c.mp4", "offset_duration_position": [0, 100], "fades": [4, 6]}
            ]"#,
        );
        let records = compilation.records();
        assert_eq!((records[0].fades.fade_in, records[0].fades.fade_out), (0, 20));
        assert_eq!((records[1].fades.fade_in, records[1].fades.fade_out), (8, 0));
        assert_eq!((records[2].fades.fade_in, records[2].fades.fade_out), (4, 6));

        // Two-element timing overlaps the anchor by the fade-in.
        assert_eq!(records[1].position, -8);
        assert_eq!(records[1].frame_final_start, 92);
        assert_eq!(records[2].frame_final_start, 192 - 4);
    }

    #[test]
    fn test_organizational_sibling_lends_crossfade() {
        let compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 100, 0]},
                {"title": "group", "crossfade": 30},
                {"filepath": "b.mp4", "offset_duration_position": [0, 100]}
            ]"#,
        );
        let records = compilation.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fades.fade_out, 30);
        assert_eq!(records[1].fades.fade_in, 30);
        assert_eq!(records[1].frame_final_start, 70);
    }

    #[test]
    fn test_declared_channel_is_halved() {
        let compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 10, 0], "channel": 8},
                {"filepath": "b.mp4", "offset_duration_position": [0, 10, 0], "channel": 1}
            ]"#,
        );
        let channels: Vec<_> = compilation.records().iter().map(|s| s.channel).collect();
        // channel 1 halves to 0 and counts as undeclared; anchor 4 is neither candidate.
        assert_eq!(channels, vec![4, 2]);
    }

    #[test]
    fn test_globals_feed_volume_and_flags() {
        let compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 10, 0], "flags": ["mute_movie"]},
                {"volume_levels": {"a.mp4": 5}, "mute_sources": {"a.mp4": ["mute_sound"]}}
            ]"#,
        );
        let strip = compilation.records()[0];
        assert_eq!(strip.volume, 5.0);
        assert!(strip.has_flag(StripFlag::MuteAudio));
        assert!(strip.has_flag(StripFlag::MuteVideo));
    }

    #[test]
    fn test_malformed_timing_is_fatal() {
        let description =
            StripDescription::parse(r#"[{"filepath": "a.mp4", "offset_duration_position": [3]}]"#)
                .unwrap();
        let err = PlacementEngine::with_defaults().place(&description).unwrap_err();
        assert!(matches!(err, DescriptionError::MalformedTiming { len: 1, .. }));
    }

    #[test]
    fn test_overlap_channel_video_end_tracks_duration() {
        let mut compilation = place(
            r#"[
                {"filepath": "a.mp4", "offset_duration_position": [0, 100, 0]},
                {"filepath": "b.mp4", "offset_duration_position": [0, 100, 0], "fades": [0, 10]}
            ]"#,
        );
        let channel = compilation.channel_mut(3).unwrap();
        channel.assign_kind(MediaKind::Video);
        let strip = &channel.strips()[0];
        assert!(strip.on_overlap_channel);
        assert_eq!(strip.duration(), 90);
        assert_eq!(strip.frame_final_end() - strip.frame_final_start, 90);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_leaf() -> impl Strategy<Value = StripDecl> {
            (0i64..50, 1i64..200, -20i64..20, 0i64..30).prop_map(|(offset, duration, position, fade)| {
                StripDecl {
                    filepath: Some(format!("f{offset}.mp4")),
                    fades: Some(vec![fade, fade]),
                    offset_duration_position: vec![offset, duration, position],
                    ..StripDecl::default()
                }
            })
        }

        fn arb_tree() -> impl Strategy<Value = Vec<StripDecl>> {
            let tree = arb_leaf().prop_recursive(3, 24, 4, |inner| {
                (arb_leaf(), prop::collection::vec(inner, 0..4)).prop_map(|(mut head, children)| {
                    head.strips = children;
                    head
                })
            });
            prop::collection::vec(tree, 1..5)
        }

        /// Walk declarations in placement order, checking that no strip
        /// shares its anchor's channel.
        fn check_alternation(
            siblings: &[StripDecl],
            records: &[&StripRecord],
            next: &mut usize,
            parent: Option<i64>,
        ) -> Result<(), TestCaseError> {
            let mut anchor = parent;
            for decl in siblings {
                let channel = records[*next].channel;
                *next += 1;
                prop_assert_ne!(Some(channel), anchor);
                check_alternation(&decl.strips, records, next, Some(channel))?;
                anchor = Some(channel);
            }
            Ok(())
        }

        proptest! {
            /// Every record's end minus start equals its duration, for either kind.
            #[test]
            fn end_minus_start_is_duration(strips in arb_tree(), video in any::<bool>()) {
                let description = StripDescription { strips, ..StripDescription::default() };
                let mut compilation = PlacementEngine::with_defaults().place(&description).unwrap();
                let kind = if video { MediaKind::Video } else { MediaKind::Audio };
                let ids: Vec<i64> = compilation.channels.iter().map(|c| c.id).collect();
                for id in ids {
                    compilation.channel_mut(id).unwrap().assign_kind(kind);
                }
                for strip in compilation.records() {
                    prop_assert_eq!(strip.frame_final_end() - strip.frame_final_start, strip.duration());
                    prop_assert!(strip.duration() <= strip.raw_duration);
                }
            }

            /// Strips without a declared channel never land on their anchor's channel.
            #[test]
            fn undeclared_channel_alternates(strips in arb_tree()) {
                let description = StripDescription { strips, ..StripDescription::default() };
                let compilation = PlacementEngine::with_defaults().place(&description).unwrap();
                let records = compilation.records();
                let mut next = 0;
                check_alternation(&description.strips, &records, &mut next, None)?;
                prop_assert_eq!(next, records.len());
            }
        }
    }
}
