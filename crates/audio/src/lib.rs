use std::path::PathBuf;

mod clip;
mod decode;
mod resample;

pub use clip::{clip_file_name, write_wav_mono_i16, ClipExtractor, ClipWindow};
pub use decode::{AudioMetadata, ProcessedAudio};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("unsupported audio format '{format}' for {}", path.display())]
    Unsupported { path: PathBuf, format: String },
    #[error("resample error: {0}")]
    Resample(String),
    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
    #[error("{entity_id} lies outside the recording ({duration:.3}s)")]
    OutsideRecording { entity_id: String, duration: f64 },
}

pub type Result<T> = std::result::Result<T, AudioError>;
