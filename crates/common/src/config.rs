//! Compiler configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StripcutError, StripcutResult};

/// Global compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Clock, fade, and volume constants.
    pub timing: TimingConfig,

    /// Channel allocation parameters.
    pub channels: ChannelConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Clock and volume-automation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Audio clock units per video frame.
    pub audio_clock_delta: i64,

    /// Video clock units per video frame.
    pub video_clock_delta: i64,

    /// Floor volume at the outer edge of a ramp or inside a mute dip.
    pub fade_min: f64,

    /// Drop below the nominal volume at the quarter point of a ramp.
    pub fade_delta: f64,

    /// Volume for files missing from the global volume table.
    /// Use 1.0 for the ratio convention.
    pub default_volume: f64,

    /// Synthesize fade-in/fade-out ramps. Mutes and explicit levels
    /// are emitted regardless.
    pub create_fades: bool,
}

/// Channel allocation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel used when the anchor sits on neither candidate.
    pub primary: i64,

    /// The alternate channel. Video fade-outs on this channel overlap
    /// the next clip instead of shortening it.
    pub overlap: i64,

    /// Declared channel ids are divided by this (two sub-tracks per
    /// declared channel in the target format).
    pub declared_divisor: i64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "stripcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            audio_clock_delta: 800,
            video_clock_delta: 1,
            fade_min: -80.0,
            fade_delta: 10.0,
            default_volume: 0.0,
            create_fades: true,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            primary: 2,
            overlap: 3,
            declared_divisor: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl CompilerConfig {
    /// Load config from a JSON file. Missing fields keep their defaults.
    pub fn load_from(path: impl AsRef<Path>) -> StripcutResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StripcutError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded compiler config");
        Ok(config)
    }

    /// Save config as pretty-printed JSON.
    pub fn save_to(&self, path: impl AsRef<Path>) -> StripcutResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would make channel or clock arithmetic meaningless.
    pub fn validate(&self) -> StripcutResult<()> {
        if self.channels.declared_divisor <= 0 {
            return Err(StripcutError::config("channels.declared_divisor must be positive"));
        }
        if self.channels.primary == self.channels.overlap {
            return Err(StripcutError::config(
                "channels.primary and channels.overlap must differ",
            ));
        }
        if self.timing.audio_clock_delta <= 0 || self.timing.video_clock_delta <= 0 {
            return Err(StripcutError::config("clock deltas must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.timing.audio_clock_delta, 800);
        assert_eq!(config.timing.fade_min, -80.0);
        assert_eq!(config.channels.primary, 2);
        assert_eq!(config.channels.overlap, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"timing": {"default_volume": 1.0}}"#).unwrap();
        assert_eq!(config.timing.default_volume, 1.0);
        assert_eq!(config.timing.audio_clock_delta, 800);
        assert!(config.timing.create_fades);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_equal_candidates() {
        let mut config = CompilerConfig::default();
        config.channels.overlap = config.channels.primary;
        assert!(matches!(config.validate(), Err(StripcutError::Config { .. })));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("stripcut_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = CompilerConfig::default();
        config.timing.fade_delta = 15.0;
        config.save_to(&path).unwrap();

        let loaded = CompilerConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let err = CompilerConfig::load_from("/nonexistent/stripcut.json").unwrap_err();
        assert!(matches!(err, StripcutError::FileNotFound { .. }));
    }
}
