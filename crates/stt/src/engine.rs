use palabra_audio::ProcessedAudio;
use palabra_config::AudioConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One word guess from a transcription engine. Times are in seconds.
///
/// Field aliases accept the shapes written by common Whisper front-ends
/// (`word`/`start`/`end`/`probability`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordHypothesis {
    #[serde(alias = "word")]
    pub text: String,
    #[serde(alias = "start")]
    pub start_time: f64,
    #[serde(alias = "end")]
    pub end_time: f64,
    #[serde(alias = "probability")]
    pub confidence: f64,
}

impl WordHypothesis {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64, confidence: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
            confidence,
        }
    }
}

/// Standard sample rate for STT processing.
pub const STT_SAMPLE_RATE: u32 = 16000;

pub trait SttEngine: Send + Sync {
    /// Transcribe audio samples (expected at 16kHz mono).
    fn transcribe(&self, audio: &[f32]) -> crate::Result<Vec<WordHypothesis>>;

    /// Transcribe an audio file directly.
    ///
    /// Default implementation reads the WAV file and calls `transcribe()`.
    fn transcribe_file(&self, path: &Path) -> crate::Result<Vec<WordHypothesis>> {
        let samples = read_wav_mono_f32_16k(path)?;
        self.transcribe(&samples)
    }

    fn model_name(&self) -> &str;

    fn supported_languages(&self) -> Vec<&'static str> {
        vec!["es"]
    }
}

/// Read a WAV file and return mono f32 samples at 16kHz.
pub fn read_wav_mono_f32_16k(path: &Path) -> crate::Result<Vec<f32>> {
    let config = AudioConfig {
        sample_rate: STT_SAMPLE_RATE,
        channels: 1,
    };
    let audio = ProcessedAudio::load(path, &config)?;
    Ok(audio.samples().to_vec())
}
