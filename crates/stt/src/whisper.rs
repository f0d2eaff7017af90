//! whisper.cpp transcription through `whisper-rs`.
//!
//! Runs with token timestamps and a one-word segment length so every
//! returned segment is a single word hypothesis.

use std::path::Path;
use std::sync::Mutex;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::engine::{SttEngine, WordHypothesis};
use crate::{Result, SttError};

pub struct WhisperEngine {
    context: Mutex<WhisperContext>,
    model_name: String,
    language: String,
    temperature: f32,
}

impl WhisperEngine {
    /// Load a ggml model file.
    pub fn new(model_path: impl AsRef<Path>, language: &str, temperature: f32) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(SttError::ModelNotLoaded);
        }
        let path_str = model_path
            .to_str()
            .ok_or_else(|| SttError::TranscriptionFailed("model path is not UTF-8".to_string()))?;

        let context = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::TranscriptionFailed(e.to_string()))?;

        let model_name = model_path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("whisper")
            .to_string();

        tracing::info!(
            model = %model_path.display(),
            language = language,
            "whisper_model_loaded"
        );

        Ok(Self {
            context: Mutex::new(context),
            model_name,
            language: language.to_string(),
            temperature,
        })
    }
}

fn is_special_token(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("[_") || text.starts_with("<|")
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32]) -> Result<Vec<WordHypothesis>> {
        if audio.is_empty() {
            return Err(SttError::InvalidAudioFormat);
        }
        let context = self
            .context
            .lock()
            .map_err(|_| SttError::TranscriptionFailed("whisper context lock poisoned".into()))?;
        let mut state = context
            .create_state()
            .map_err(|e| SttError::TranscriptionFailed(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.language.as_str()));
        params.set_translate(false);
        params.set_token_timestamps(true);
        params.set_split_on_word(true);
        params.set_max_len(1);
        params.set_temperature(self.temperature);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, audio)
            .map_err(|e| SttError::TranscriptionFailed(e.to_string()))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| SttError::TranscriptionFailed(e.to_string()))?;

        let mut words = Vec::with_capacity(num_segments.max(0) as usize);
        for i in 0..num_segments {
            let text = match state.full_get_segment_text(i) {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    tracing::warn!(segment = i, error = %e, "whisper_segment_unreadable");
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }
            // Segment timestamps are in centiseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0);
            let t1 = state.full_get_segment_t1(i).unwrap_or(t0);

            let n_tokens = state.full_n_tokens(i).unwrap_or(0);
            let mut prob_sum = 0.0f64;
            let mut prob_count = 0usize;
            for j in 0..n_tokens {
                let token_text = state.full_get_token_text(i, j).unwrap_or_default();
                if is_special_token(&token_text) {
                    continue;
                }
                if let Ok(p) = state.full_get_token_prob(i, j) {
                    prob_sum += p as f64;
                    prob_count += 1;
                }
            }
            let confidence = if prob_count > 0 {
                (prob_sum / prob_count as f64).clamp(0.0, 1.0)
            } else {
                0.0
            };

            words.push(WordHypothesis::new(
                text,
                t0 as f64 / 100.0,
                t1 as f64 / 100.0,
                confidence,
            ));
        }

        tracing::debug!(words = words.len(), "whisper_transcription_done");
        Ok(words)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn supported_languages(&self) -> Vec<&'static str> {
        vec!["es", "en", "pt", "fr", "it", "de", "ca"]
    }
}
