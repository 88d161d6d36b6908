//! Line-oriented timeline document injector.
//!
//! Scans a Cinelerra document once, tracking the kind and title of the
//! current track. Generated lines are inserted before two markers:
//!
//! - `</EDITS>`: the channel's edit blocks (any track kind)
//! - `</FADEAUTOS>`: the channel's volume keyframes (audio tracks only)
//!
//! Markers are matched on the trimmed line; the line itself is always
//! written back unchanged.

use std::io::{self, BufRead, Write};

use stripcut_common::clock::{ClockScale, MediaKind};
use stripcut_common::config::CompilerConfig;
use stripcut_processing_core::edits::EditEmitter;
use stripcut_processing_core::keyframes::KeyframeSynthesizer;
use stripcut_processing_core::placement::Compilation;

use crate::fragment::{CinelerraFormat, FragmentFormat};

/// A recognized template line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `<TRACK ... TYPE=AUDIO>`; `None` for an unrecognized type.
    Track(Option<MediaKind>),
    /// `<TITLE>3</TITLE>`; `None` when the title is not a channel id.
    Title(Option<i64>),
    /// `</EDITS>`
    EndEdits,
    /// `</FADEAUTOS>`
    EndFadeAutos,
}

impl Marker {
    /// Classify a template line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        if line.starts_with("</EDITS>") {
            return Some(Self::EndEdits);
        }
        if line.starts_with("</FADEAUTOS>") {
            return Some(Self::EndFadeAutos);
        }
        if let Some(rest) = line.strip_prefix("<TITLE>") {
            let title = rest.split("</TITLE>").next().unwrap_or(rest);
            return Some(Self::Title(title.trim().parse().ok()));
        }
        if let Some(rest) = line.strip_prefix("<TRACK") {
            if rest.starts_with(|c: char| c.is_whitespace() || c == '>') {
                return Some(Self::Track(track_type(rest)));
            }
        }
        None
    }
}

/// Value of the `TYPE` attribute of a track tag.
fn track_type(attributes: &str) -> Option<MediaKind> {
    attributes
        .trim_end_matches('>')
        .split_whitespace()
        .find_map(|attr| attr.strip_prefix("TYPE="))
        .map(|value| value.trim_end_matches('>').trim_matches('"'))
        .and_then(|value| value.parse().ok())
}

/// What an injection pass inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionStats {
    /// Template lines read.
    pub lines: usize,
    /// Track declarations seen.
    pub tracks: usize,
    /// Edit lines inserted.
    pub edits: usize,
    /// Automation lines inserted.
    pub keyframes: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct TrackState {
    kind: Option<MediaKind>,
    id: Option<i64>,
}

/// Streams a template document, splicing in a compilation's fragments.
pub struct TimelineInjector<'a, F: FragmentFormat = CinelerraFormat> {
    compilation: &'a mut Compilation,
    emitter: EditEmitter,
    synthesizer: KeyframeSynthesizer,
    scale: ClockScale,
    format: F,
    track: TrackState,
    stats: InjectionStats,
}

impl<'a> TimelineInjector<'a, CinelerraFormat> {
    pub fn new(compilation: &'a mut Compilation, config: &CompilerConfig) -> Self {
        Self::with_format(compilation, config, CinelerraFormat)
    }
}

impl<'a, F: FragmentFormat> TimelineInjector<'a, F> {
    pub fn with_format(compilation: &'a mut Compilation, config: &CompilerConfig, format: F) -> Self {
        let scale = ClockScale::from(&config.timing);
        Self {
            compilation,
            emitter: EditEmitter::new(scale),
            synthesizer: KeyframeSynthesizer::new(&config.timing),
            scale,
            format,
            track: TrackState::default(),
            stats: InjectionStats::default(),
        }
    }

    /// Copy `input` to `output` byte for byte, inserting generated lines at
    /// markers. Generated lines use the marker line's line ending.
    pub fn inject<R: BufRead, W: Write>(
        mut self,
        mut input: R,
        output: &mut W,
    ) -> io::Result<InjectionStats> {
        tracing::debug!(format = self.format.name(), "injecting into template");
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            self.stats.lines += 1;

            let eol = if line.ends_with("\r\n") { "\r\n" } else { "\n" };
            for generated in self.process_line(&line) {
                write!(output, "{generated}{eol}")?;
            }
            output.write_all(line.as_bytes())?;
        }
        output.flush()?;
        Ok(self.stats)
    }

    /// Inject into an in-memory template.
    pub fn inject_str(self, template: &str) -> io::Result<(String, InjectionStats)> {
        let mut output = Vec::with_capacity(template.len());
        let stats = self.inject(template.as_bytes(), &mut output)?;
        let text = String::from_utf8(output).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok((text, stats))
    }

    /// Update track state for a line and return the lines to insert before it.
    fn process_line(&mut self, line: &str) -> Vec<String> {
        match Marker::parse(line) {
            Some(Marker::Track(kind)) => {
                self.stats.tracks += 1;
                self.track = TrackState { kind, id: None };
                if kind.is_none() {
                    tracing::warn!(line = line.trim(), "track without a recognized TYPE");
                }
                vec![]
            }
            Some(Marker::Title(id)) => {
                if id.is_none() {
                    tracing::debug!(line = line.trim(), "track title is not a channel id");
                }
                self.track.id = id;
                vec![]
            }
            Some(Marker::EndEdits) => self.edit_lines(),
            Some(Marker::EndFadeAutos) => self.keyframe_lines(),
            None => vec![],
        }
    }

    fn edit_lines(&mut self) -> Vec<String> {
        let (Some(id), Some(kind)) = (self.track.id, self.track.kind) else {
            return vec![];
        };
        let Some(channel) = self.compilation.channel_mut(id) else {
            return vec![];
        };

        channel.assign_kind(kind);
        let lines: Vec<String> = self
            .emitter
            .emit_channel(channel)
            .iter()
            .map(|block| self.format.edit(block))
            .collect();

        tracing::debug!(channel = id, %kind, edits = lines.len(), "inserted edits");
        self.stats.edits += lines.len();
        lines
    }

    fn keyframe_lines(&mut self) -> Vec<String> {
        if self.track.kind != Some(MediaKind::Audio) {
            return vec![];
        }
        let Some(id) = self.track.id else {
            return vec![];
        };
        let Some(channel) = self.compilation.channel_mut(id) else {
            return vec![];
        };

        channel.assign_kind(MediaKind::Audio);
        let lines: Vec<String> = self
            .synthesizer
            .synthesize_channel(channel)
            .iter()
            .flatten()
            .map(|(&position, &value)| {
                self.format
                    .keyframe(self.scale.to_units(MediaKind::Audio, position), value)
            })
            .collect();

        tracing::debug!(channel = id, keyframes = lines.len(), "inserted fade automation");
        self.stats.keyframes += lines.len();
        lines
    }
}
