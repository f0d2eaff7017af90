//! Typed configuration for the palabra pipeline.
//!
//! A single immutable [`Config`] is loaded once (YAML file, then
//! `PALABRA_*` environment overrides, then validation) and handed to each
//! component constructor by reference.

mod env;
mod error;
mod sections;

pub use env::ENV_PREFIX;
pub use error::{ConfigError, ConfigResult};
pub use sections::{
    AudioConfig, BufferingConfig, DefaultSpeakerConfig, DiarizationConfig, LogFormat, LogLevel,
    LoggingConfig, OutputConfig, QualityConfig, SpeakersConfig, WhisperConfig, WhisperModel,
};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

const GENDERS: [&str; 3] = ["M", "F", "Unknown"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub whisper: WhisperConfig,
    pub speakers: SpeakersConfig,
    pub diarization: DiarizationConfig,
    pub quality: QualityConfig,
    pub buffering: BufferingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from a YAML file, applying overrides from the process environment.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_yaml_with_env(&contents, path, std::env::vars())?;
        tracing::debug!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    /// Load `path` if given, else `config.yaml` if present, else defaults
    /// (still subject to environment overrides).
    pub fn discover(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load(default_path);
        }
        Self::from_yaml_with_env("", default_path, std::env::vars())
    }

    /// Parse YAML content with an explicit set of environment variables.
    pub fn from_yaml_with_env<I, K, V>(contents: &str, origin: &Path, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let invalid_yaml = |e: serde_yml::Error| ConfigError::InvalidYaml {
            path: origin.to_path_buf(),
            message: e.to_string(),
        };

        let document: serde_yml::Value = if contents.trim().is_empty() {
            serde_yml::Value::Null
        } else {
            serde_yml::from_str(contents).map_err(invalid_yaml)?
        };
        let document = env::apply_overrides(document, vars)?;
        let config: Config = serde_yml::from_value(document).map_err(invalid_yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and cross-field consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        let audio = &self.audio;
        if !(8_000..=48_000).contains(&audio.sample_rate) {
            return Err(ConfigError::invalid(
                "audio.sample_rate",
                "must be between 8000 and 48000",
            ));
        }
        if !(1..=2).contains(&audio.channels) {
            return Err(ConfigError::invalid("audio.channels", "must be 1 or 2"));
        }

        if !(0.0..=1.0).contains(&self.whisper.temperature) {
            return Err(ConfigError::invalid(
                "whisper.temperature",
                "must be between 0.0 and 1.0",
            ));
        }
        if self.whisper.language.trim().is_empty() {
            return Err(ConfigError::invalid("whisper.language", "must not be empty"));
        }

        if let Some(speaker) = &self.speakers.default_speaker {
            if !GENDERS.contains(&speaker.gender.as_str()) {
                return Err(ConfigError::invalid(
                    "speakers.default_speaker.gender",
                    "must be one of M, F, Unknown",
                ));
            }
        }

        let diarization = &self.diarization;
        if diarization.min_speakers < 1 {
            return Err(ConfigError::invalid("diarization.min_speakers", "must be >= 1"));
        }
        if !(1..=50).contains(&diarization.max_speakers)
            || diarization.max_speakers < diarization.min_speakers
        {
            return Err(ConfigError::invalid(
                "diarization.max_speakers",
                "must be between min_speakers and 50",
            ));
        }
        for (field, value) in [
            ("diarization.segmentation_threshold", diarization.segmentation_threshold),
            ("diarization.clustering_threshold", diarization.clustering_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be between 0.0 and 1.0"));
            }
        }
        for (field, value) in [
            ("diarization.min_coverage", diarization.min_coverage),
            ("diarization.max_short_segment_ratio", diarization.max_short_segment_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be between 0.0 and 1.0"));
            }
        }
        if diarization.min_segment_duration < 0.0
            || diarization.merge_gap < 0.0
            || diarization.overlap_tolerance < 0.0
        {
            return Err(ConfigError::invalid(
                "diarization",
                "durations must not be negative",
            ));
        }

        let quality = &self.quality;
        if !(0.0..=1.0).contains(&quality.min_confidence) {
            return Err(ConfigError::invalid(
                "quality.min_confidence",
                "must be between 0.0 and 1.0",
            ));
        }
        if quality.min_word_duration < 0.0 {
            return Err(ConfigError::invalid("quality.min_word_duration", "must be >= 0"));
        }
        if quality.max_word_duration < 0.1 || quality.max_word_duration <= quality.min_word_duration
        {
            return Err(ConfigError::invalid(
                "quality.max_word_duration",
                "must be >= 0.1 and greater than min_word_duration",
            ));
        }
        let [min_syllables, max_syllables] = quality.syllable_range;
        if min_syllables < 1 || min_syllables >= max_syllables {
            return Err(ConfigError::invalid(
                "quality.syllable_range",
                "must be [min, max] with min < max and min >= 1",
            ));
        }

        if !(0.0..0.5).contains(&self.buffering.zero_gap_tolerance) {
            return Err(ConfigError::invalid(
                "buffering.zero_gap_tolerance",
                "must be between 0.0 and 0.5 seconds",
            ));
        }

        Ok(())
    }
}
