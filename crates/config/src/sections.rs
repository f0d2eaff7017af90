//! Configuration sections and their defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Audio decoding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Target sample rate after resampling.
    pub sample_rate: u32,
    /// Channel count the decoder produces (1 = downmix to mono).
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

/// Whisper model sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transcription engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    pub model: WhisperModel,
    /// Path to a ggml model file. Required by the native Whisper engine.
    pub model_path: Option<PathBuf>,
    pub language: String,
    pub temperature: f32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model: WhisperModel::Base,
            model_path: None,
            language: "es".to_string(),
            temperature: 0.0,
        }
    }
}

/// Descriptive metadata for the default speaker (id 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSpeakerConfig {
    pub name: String,
    pub gender: String,
    pub region: String,
}

impl Default for DefaultSpeakerConfig {
    fn default() -> Self {
        Self {
            name: "Default Speaker".to_string(),
            gender: "Unknown".to_string(),
            region: "Unknown".to_string(),
        }
    }
}

/// Speaker attribution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpeakersConfig {
    pub enable_diarization: bool,
    pub default_speaker: Option<DefaultSpeakerConfig>,
}

/// Diarization backend parameters and the quality gate applied to its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarizationConfig {
    pub model: String,
    pub min_speakers: u32,
    pub max_speakers: u32,
    pub segmentation_threshold: f32,
    pub clustering_threshold: f32,
    /// Segments shorter than this (seconds) count as "short".
    pub min_segment_duration: f64,
    /// Minimum fraction of the declared duration the segments must cover.
    pub min_coverage: f64,
    /// Results with a larger share of short segments are rejected.
    pub max_short_segment_ratio: f64,
    /// Same-speaker segments separated by at most this gap (seconds) are merged.
    pub merge_gap: f64,
    /// Pairwise overlap (seconds) tolerated between segments.
    pub overlap_tolerance: f64,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            model: "pyannote/speaker-diarization".to_string(),
            min_speakers: 1,
            max_speakers: 10,
            segmentation_threshold: 0.5,
            clustering_threshold: 0.7,
            min_segment_duration: 0.5,
            min_coverage: 0.7,
            max_short_segment_ratio: 0.8,
            merge_gap: 0.5,
            overlap_tolerance: 0.01,
        }
    }
}

/// Thresholds for the word quality filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub min_confidence: f64,
    /// Seconds.
    pub min_word_duration: f64,
    /// Seconds.
    pub max_word_duration: f64,
    /// Inclusive `[min, max]` syllable count.
    pub syllable_range: [usize; 2],
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.8,
            min_word_duration: 0.3,
            max_word_duration: 3.0,
            syllable_range: [2, 6],
        }
    }
}

/// Padding applied around extracted clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferingConfig {
    pub buffer_ms: u32,
    /// Gaps with an absolute value below this (seconds) are zero-gaps.
    pub zero_gap_tolerance: f64,
}

impl Default for BufferingConfig {
    fn default() -> Self {
        Self {
            buffer_ms: 50,
            zero_gap_tolerance: 0.001,
        }
    }
}

impl BufferingConfig {
    pub fn buffer_secs(&self) -> f64 {
        f64::from(self.buffer_ms) / 1000.0
    }
}

/// Where and how results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub database_path: PathBuf,
    pub pretty_print: bool,
    pub backup_on_update: bool,
    /// When set, word clips are extracted into this directory.
    pub clips_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("word_database.json"),
            pretty_print: true,
            backup_on_update: true,
            clips_dir: None,
        }
    }
}

/// Log verbosity. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        match value.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!(
                "level must be one of DEBUG, INFO, WARNING, ERROR (got {other})"
            )),
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
        .to_string()
    }
}

/// Log output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Structured,
    /// Human-readable lines.
    Simple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Structured,
            file: None,
            console: true,
        }
    }
}
