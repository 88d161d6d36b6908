//! Strip description files.
//!
//! A description is a JSON array of strip declarations. Declarations nest
//! through `strips`; nodes without a `filepath` only group their siblings.
//! The last element may instead be a record of global tables:
//!
//! ```json
//! [
//!   {"filepath": "intro.mp4", "offset_duration_position": [0, 250, 0]},
//!   {"filepath": "talk.mp4", "offset_duration_position": [120, 900], "crossfade": 25},
//!   {"volume_levels": {"talk.mp4": -6}, "mute_sources": {"intro.mp4": ["mute_audio"]}}
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::strip::{Fades, Frame, StripFlag, VolumeValue};

/// One declared clip (or an organizational node without `filepath`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StripDecl {
    /// Clip source. Nodes without one are skipped along with their children.
    #[serde(default)]
    pub filepath: Option<String>,

    /// `[fade_in, fade_out]` or `[fade_in, fade_out, in_position, out_position]`.
    #[serde(default)]
    pub fades: Option<Vec<Frame>>,

    /// Fade length this node lends to its neighbors: the previous sibling's
    /// fade-out and the next sibling's fade-in.
    #[serde(default)]
    pub crossfade: Option<Frame>,

    /// Declared channel, before division by the sub-track factor.
    #[serde(default)]
    pub channel: Option<i64>,

    /// `[offset, duration, position]` or `[offset, duration]`.
    #[serde(default)]
    pub offset_duration_position: Vec<Frame>,

    /// Position used with the two-element timing form.
    #[serde(default)]
    pub position: Option<Frame>,

    #[serde(default, deserialize_with = "deserialize_mutes")]
    pub mutes: Vec<(Frame, Frame)>,

    #[serde(default, deserialize_with = "deserialize_levels")]
    pub volume_levels: Vec<(Frame, VolumeValue)>,

    /// Unknown flag names are skipped with a warning.
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub flags: Vec<StripFlag>,

    /// Children, anchored to this strip's end.
    #[serde(default)]
    pub strips: Vec<StripDecl>,
}

/// Resolved `offset_duration_position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub offset: Frame,
    pub duration: Frame,
    pub position: Frame,
}

impl StripDecl {
    /// Whether this node references media.
    pub fn is_placeable(&self) -> bool {
        self.filepath.is_some()
    }

    /// Explicit fades padded to four values, or `None` when not declared.
    pub fn declared_fades(&self) -> Option<Fades> {
        let declared = self.fades.as_ref()?;
        let mut values = [0; 4];
        for (slot, value) in values.iter_mut().zip(declared) {
            *slot = *value;
        }
        Some(Fades::from_array(values))
    }

    /// Resolve the timing tuple. The two-element form positions the strip
    /// at `position` (or `-fade_in`, overlapping the anchor by the fade).
    /// Longer tuples fall back to their first two elements.
    pub fn timing(&self, fade_in: Frame) -> Result<Timing, DescriptionError> {
        match self.offset_duration_position.as_slice() {
            &[offset, duration, position] => Ok(Timing {
                offset,
                duration,
                position,
            }),
            &[offset, duration, ..] => Ok(Timing {
                offset,
                duration,
                position: self.position.unwrap_or(-fade_in),
            }),
            other => Err(DescriptionError::MalformedTiming {
                filepath: self.filepath.clone().unwrap_or_default(),
                len: other.len(),
            }),
        }
    }
}

/// Global tables carried by the trailing record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionGlobals {
    /// Nominal volume per source file.
    #[serde(default)]
    pub volume_levels: BTreeMap<String, f64>,

    /// Flags applied to every strip of a source file.
    #[serde(default, deserialize_with = "deserialize_flag_table")]
    pub mute_sources: BTreeMap<String, Vec<StripFlag>>,
}

/// A parsed strip description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StripDescription {
    pub strips: Vec<StripDecl>,
    pub globals: DescriptionGlobals,
}

impl StripDescription {
    /// Parse a description from JSON text.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        Self::from_items(serde_json::from_str(content)?)
    }

    /// Parse a description from YAML text.
    pub fn parse_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let items: Vec<Value> = serde_yaml::from_str(content)?;
        Self::from_items(items).map_err(serde::de::Error::custom)
    }

    fn from_items(mut items: Vec<Value>) -> Result<Self, serde_json::Error> {
        let globals = match items.last() {
            Some(last) if is_globals_record(last) => {
                let record = items.pop().unwrap_or_default();
                serde_json::from_value(record)?
            }
            _ => DescriptionGlobals::default(),
        };

        let strips: Vec<StripDecl> = serde_json::from_value(Value::Array(items))?;
        Ok(Self { strips, globals })
    }

    /// Load a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DescriptionError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let description = if is_yaml_path(path) {
            Self::parse_yaml(&content).map_err(|e| DescriptionError::YamlError {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            Self::parse(&content).map_err(|e| DescriptionError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?
        };
        tracing::debug!(
            path = %path.display(),
            roots = description.strips.len(),
            volume_entries = description.globals.volume_levels.len(),
            "loaded strip description"
        );
        Ok(description)
    }

    /// Nominal volume for a source file.
    pub fn volume_for(&self, filepath: &str, default_volume: f64) -> f64 {
        self.globals
            .volume_levels
            .get(filepath)
            .copied()
            .unwrap_or(default_volume)
    }

    /// Default flags for a source file.
    pub fn default_flags_for(&self, filepath: &str) -> &[StripFlag] {
        self.globals
            .mute_sources
            .get(filepath)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

/// The trailing record has no media and carries at least one table.
fn is_globals_record(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    !object.contains_key("filepath")
        && (object.get("volume_levels").is_some_and(Value::is_object)
            || object.contains_key("mute_sources"))
}

/// Flatten `[a, b, c, d]` or `[[a, b], [c, d]]` into one value list.
/// An odd trailing value is dropped.
fn flatten_pairs(items: Vec<Value>) -> Result<Vec<(Value, Value)>, String> {
    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(pair) if pair.len() == 2 => flat.extend(pair),
            Value::Array(other) => {
                return Err(format!("expected a pair, got {} elements", other.len()))
            }
            scalar => flat.push(scalar),
        }
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        pairs.push((a, b));
    }
    Ok(pairs)
}

fn as_frame(value: &Value) -> Result<Frame, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("expected an integer frame, got {value}"))
}

fn deserialize_mutes<'de, D>(deserializer: D) -> Result<Vec<(Frame, Frame)>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<Value>::deserialize(deserializer)?;
    flatten_pairs(items)
        .and_then(|pairs| {
            pairs
                .iter()
                .map(|(start, end)| -> Result<(Frame, Frame), String> {
                    Ok((as_frame(start)?, as_frame(end)?))
                })
                .collect()
        })
        .map_err(D::Error::custom)
}

fn deserialize_levels<'de, D>(deserializer: D) -> Result<Vec<(Frame, VolumeValue)>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<Value>::deserialize(deserializer)?;
    flatten_pairs(items)
        .and_then(|pairs| {
            pairs
                .into_iter()
                .map(|(position, value)| -> Result<(Frame, VolumeValue), String> {
                    Ok((as_frame(&position)?, VolumeValue::try_from(value)?))
                })
                .collect()
        })
        .map_err(D::Error::custom)
}

/// Keep the flags this compiler knows, warning about the rest.
fn known_flags(values: Vec<Value>) -> Vec<StripFlag> {
    values
        .into_iter()
        .filter_map(|value| match StripFlag::deserialize(&value) {
            Ok(flag) => Some(flag),
            Err(_) => {
                tracing::warn!(flag = %value, "ignoring unknown strip flag");
                None
            }
        })
        .collect()
}

fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<StripFlag>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(known_flags(Vec::<Value>::deserialize(deserializer)?))
}

fn deserialize_flag_table<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<StripFlag>>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = BTreeMap::<String, Vec<Value>>::deserialize(deserializer)?;
    Ok(table
        .into_iter()
        .map(|(filepath, flags)| (filepath, known_flags(flags)))
        .collect())
}

/// Errors that can occur when loading a strip description.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("YAML parse error in {path}: {source}")]
    YamlError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Malformed offset_duration_position for {filepath}: {len} element(s)")]
    MalformedTiming { filepath: String, len: usize },
}
