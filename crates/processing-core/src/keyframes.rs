//! Volume keyframe synthesis.
//!
//! Each strip yields a sparse map from absolute frame to volume. Points are
//! written in a fixed order and a later write at the same frame replaces an
//! earlier one:
//!
//! 1. fade-in ramp
//! 2. fade-out ramp
//! 3. mute dips
//! 4. explicit `volume_levels` overrides
//!
//! Explicit overrides therefore always win. A mute dip that lands on a fade
//! point also wins over the fade, whatever the declaration meant.
//!
//! A ramp is three points: the floor at its outer edge, `volume - fade_delta`
//! a quarter of the way in, and the nominal volume at its inner edge.
//!
//! ```text
//!            volume ─────────────────────────── volume
//!          /                                        \
//!   vol-Δ ●  (quarter point)           (quarter point) ● vol-Δ
//!        /                                            \
//!  floor ●                                              ● floor
//!        start                                        end
//! ```

use std::collections::BTreeMap;

use stripcut_common::config::TimingConfig;
use stripcut_project_model::channel::Channel;
use stripcut_project_model::strip::{Frame, StripFlag, StripRecord};

/// Absolute frame → volume, ordered by frame.
pub type Keyframes = BTreeMap<Frame, f64>;

/// Mute dips reach the floor this many frames after the window opens and
/// leave it this many frames before it closes.
const MUTE_EDGE_FRAMES: Frame = 2;

/// Derives volume automation for strips.
#[derive(Debug, Clone)]
pub struct KeyframeSynthesizer {
    fade_min: f64,
    fade_delta: f64,
    create_fades: bool,
}

impl KeyframeSynthesizer {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            fade_min: timing.fade_min,
            fade_delta: timing.fade_delta,
            create_fades: timing.create_fades,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&TimingConfig::default())
    }

    /// Keyframes for every strip of a channel, one map per strip, in order.
    pub fn synthesize_channel(&self, channel: &Channel) -> Vec<Keyframes> {
        channel.strips().iter().map(|s| self.synthesize(s)).collect()
    }

    /// Keyframes for one strip. Strips with muted audio get none.
    pub fn synthesize(&self, strip: &StripRecord) -> Keyframes {
        let mut keyframes = Keyframes::new();
        if strip.has_flag(StripFlag::MuteAudio) {
            return keyframes;
        }

        if self.create_fades {
            self.fade_in(strip, &mut keyframes);
            self.fade_out(strip, &mut keyframes);
        }
        self.mutes(strip, &mut keyframes);
        self.overrides(strip, &mut keyframes);

        keyframes
    }

    fn fade_in(&self, strip: &StripRecord, keyframes: &mut Keyframes) {
        let fades = &strip.fades;
        if fades.fade_in <= 0 && fades.fade_in_position.is_none() {
            return;
        }

        let start = strip.frame_final_start;
        let anchor = match fades.fade_in_position {
            Some(hold) => {
                keyframes.insert(start, self.fade_min);
                start + hold
            }
            None => start,
        };

        keyframes.insert(anchor + fades.fade_in / 4, strip.volume - self.fade_delta);
        keyframes.insert(anchor, self.fade_min);
        keyframes.insert(anchor + fades.fade_in, strip.volume);
    }

    fn fade_out(&self, strip: &StripRecord, keyframes: &mut Keyframes) {
        let fades = &strip.fades;
        if fades.fade_out <= 0 && fades.fade_out_position.is_none() {
            return;
        }

        let end = strip.frame_final_end();
        let anchor = match fades.fade_out_position {
            Some(hold) => {
                keyframes.insert(end, self.fade_min);
                end - hold - fades.fade_out
            }
            None => end,
        };

        keyframes.insert(anchor - fades.fade_out / 4, strip.volume - self.fade_delta);
        keyframes.insert(anchor, self.fade_min);
        keyframes.insert(anchor - fades.fade_out, strip.volume);
    }

    fn mutes(&self, strip: &StripRecord, keyframes: &mut Keyframes) {
        let start = strip.frame_final_start;
        for &(mute_start, mute_end) in &strip.mutes {
            keyframes.insert(start + mute_start, strip.volume);
            keyframes.insert(start + mute_start + MUTE_EDGE_FRAMES, self.fade_min);
            keyframes.insert(start + mute_end - MUTE_EDGE_FRAMES, self.fade_min);
            keyframes.insert(start + mute_end, strip.volume);
        }
    }

    fn overrides(&self, strip: &StripRecord, keyframes: &mut Keyframes) {
        let start = strip.frame_final_start;
        for &(position, value) in &strip.volume_levels {
            keyframes.insert(start + position, value.resolve(strip.volume, self.fade_min));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use stripcut_project_model::strip::{Fades, VolumeValue};

    fn strip(start: Frame, duration: Frame, volume: f64) -> StripRecord {
        StripRecord {
            id: 0,
            filepath: "a.mp4".to_string(),
            kind: None,
            channel: 2,
            on_overlap_channel: false,
            offset: 0,
            raw_duration: duration,
            position: 0,
            frame_final_start: start,
            fades: Fades::default(),
            mutes: vec![],
            volume_levels: vec![],
            flags: BTreeSet::new(),
            volume,
        }
    }

    fn points(keyframes: &Keyframes) -> Vec<(Frame, f64)> {
        keyframes.iter().map(|(&p, &v)| (p, v)).collect()
    }

    #[test]
    fn test_no_automation_yields_nothing() {
        let synth = KeyframeSynthesizer::with_defaults();
        assert!(synth.synthesize(&strip(100, 200, 5.0)).is_empty());
    }

    #[test]
    fn test_symmetric_fades() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(100, 200, 5.0);
        s.fades = Fades::from_array([40, 40, 0, 0]);

        assert_eq!(
            points(&synth.synthesize(&s)),
            vec![
                (100, -80.0),
                (110, -5.0),
                (140, 5.0),
                (260, 5.0),
                (290, -5.0),
                (300, -80.0),
            ]
        );
    }

    #[test]
    fn test_fade_in_position_holds_at_floor() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(0, 200, 0.0);
        s.fades = Fades::from_array([20, 0, 30, 0]);

        assert_eq!(
            points(&synth.synthesize(&s)),
            vec![(0, -80.0), (30, -80.0), (35, -10.0), (50, 0.0)]
        );
    }

    #[test]
    fn test_fade_out_position_ramps_before_the_tail() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(0, 200, 0.0);
        s.fades = Fades::from_array([0, 20, 0, 30]);

        // Anchor at 200 - 30 - 20 = 150: ramp from 130 down to 150, floor held to 200.
        assert_eq!(
            points(&synth.synthesize(&s)),
            vec![(130, 0.0), (145, -10.0), (150, -80.0), (200, -80.0)]
        );
    }

    #[test]
    fn test_mute_window_dips_and_recovers() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(1000, 500, 3.0);
        s.mutes = vec![(0, 50), (100, 120)];

        assert_eq!(
            points(&synth.synthesize(&s)),
            vec![
                (1000, 3.0),
                (1002, -80.0),
                (1048, -80.0),
                (1050, 3.0),
                (1100, 3.0),
                (1102, -80.0),
                (1118, -80.0),
                (1120, 3.0),
            ]
        );
    }

    #[test]
    fn test_explicit_levels_override_fades() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(0, 100, 4.0);
        s.fades = Fades::from_array([20, 0, 0, 0]);
        s.volume_levels = vec![
            (0, VolumeValue::Nominal),
            (60, VolumeValue::FadeMin),
            (80, VolumeValue::Literal(-3.0)),
        ];

        let keyframes = synth.synthesize(&s);
        assert_eq!(keyframes[&0], 4.0);
        assert_eq!(keyframes[&5], -6.0);
        assert_eq!(keyframes[&20], 4.0);
        assert_eq!(keyframes[&60], -80.0);
        assert_eq!(keyframes[&80], -3.0);
    }

    #[test]
    fn test_mute_overrides_colliding_fade_point() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(0, 100, 2.0);
        s.fades = Fades::from_array([10, 0, 0, 0]);
        s.mutes = vec![(8, 30)];

        let keyframes = synth.synthesize(&s);
        // Fade-in reaches nominal at 10; the mute dip's floor at 8+2 lands on it.
        assert_eq!(keyframes[&10], -80.0);
    }

    #[test]
    fn test_muted_audio_skips_synthesis() {
        let synth = KeyframeSynthesizer::with_defaults();
        let mut s = strip(0, 100, 2.0);
        s.fades = Fades::from_array([10, 10, 0, 0]);
        s.mutes = vec![(20, 40)];
        s.flags.insert(StripFlag::MuteAudio);
        assert!(synth.synthesize(&s).is_empty());
    }

    #[test]
    fn test_create_fades_off_keeps_mutes_and_levels() {
        let timing = TimingConfig {
            create_fades: false,
            ..TimingConfig::default()
        };
        let synth = KeyframeSynthesizer::new(&timing);
        let mut s = strip(0, 100, 2.0);
        s.fades = Fades::from_array([10, 10, 0, 0]);
        s.volume_levels = vec![(50, VolumeValue::Literal(1.0))];

        assert_eq!(points(&synth.synthesize(&s)), vec![(50, 1.0)]);
    }
}
