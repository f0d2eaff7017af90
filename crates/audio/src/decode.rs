use std::path::{Path, PathBuf};

use palabra_config::AudioConfig;
use serde::Serialize;

use crate::resample::{to_mono, SincResampler};
use crate::{AudioError, Result};

const SUPPORTED_EXTENSIONS: [&str; 1] = ["wav"];

/// Properties of the source file before conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioMetadata {
    pub path: PathBuf,
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: String,
    pub size_bytes: u64,
}

/// Mono samples at the configured rate plus the source metadata.
#[derive(Debug, Clone)]
pub struct ProcessedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    metadata: AudioMetadata,
}

impl ProcessedAudio {
    /// Decode a WAV file, downmix to mono and resample to `config.sample_rate`.
    pub fn load(path: &Path, config: &AudioConfig) -> Result<Self> {
        if !path.exists() {
            return Err(AudioError::NotFound(path.to_path_buf()));
        }
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&format.as_str()) {
            return Err(AudioError::Unsupported {
                path: path.to_path_buf(),
                format,
            });
        }

        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let decode_err = |message: String| AudioError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = hound::WavReader::open(path).map_err(|e| decode_err(e.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1);

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| decode_err(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| decode_err(e.to_string()))?
            }
        };
        if interleaved.is_empty() {
            return Err(decode_err("audio contains no samples".to_string()));
        }

        let mono = to_mono(&interleaved, channels as usize);
        let duration = mono.len() as f64 / spec.sample_rate as f64;

        let samples = if spec.sample_rate == config.sample_rate {
            mono
        } else {
            SincResampler::new(spec.sample_rate, config.sample_rate)?.process_all(&mono)?
        };

        tracing::info!(
            path = %path.display(),
            duration_secs = duration,
            source_rate = spec.sample_rate,
            target_rate = config.sample_rate,
            channels = channels,
            "audio_loaded"
        );

        Ok(Self {
            samples,
            sample_rate: config.sample_rate,
            metadata: AudioMetadata {
                path: path.to_path_buf(),
                duration,
                sample_rate: spec.sample_rate,
                channels,
                format,
                size_bytes,
            },
        })
    }

    /// Wrap samples that are already mono at `sample_rate`.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, path: impl Into<PathBuf>) -> Self {
        let duration = samples.len() as f64 / sample_rate.max(1) as f64;
        Self {
            metadata: AudioMetadata {
                path: path.into(),
                duration,
                sample_rate,
                channels: 1,
                format: "pcm".to_string(),
                size_bytes: (samples.len() * std::mem::size_of::<f32>()) as u64,
            },
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn metadata(&self) -> &AudioMetadata {
        &self.metadata
    }

    pub fn duration(&self) -> f64 {
        self.metadata.duration
    }
}
