use std::path::PathBuf;

mod engine;
mod replay;
#[cfg(feature = "whisper")]
mod whisper;

pub use engine::{read_wav_mono_f32_16k, SttEngine, WordHypothesis, STT_SAMPLE_RATE};
pub use replay::ReplayEngine;
#[cfg(feature = "whisper")]
pub use whisper::WhisperEngine;

#[derive(Debug, thiserror::Error)]
pub enum SttError {
    #[error("model not loaded")]
    ModelNotLoaded,
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("invalid audio format")]
    InvalidAudioFormat,
    #[error(transparent)]
    Audio(#[from] palabra_audio::AudioError),
    #[error("invalid transcript file {path}: {message}")]
    InvalidTranscript { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, SttError>;

/// Whether this build can run Whisper locally.
pub const fn whisper_available() -> bool {
    cfg!(feature = "whisper")
}
