mod processor;
mod rttm;
mod segment;

pub use processor::{
    merge_close_segments, speaker_label_to_id, DiarizationProcessor, Diarizer, SpeakerCountHint,
    SpeakerTurn, DEFAULT_TURN_CONFIDENCE,
};
pub use rttm::{parse_rttm, RttmDiarizer};
pub use segment::{DiarizationResult, SpeakerSegment, DEFAULT_OVERLAP_TOLERANCE};

#[derive(Debug, thiserror::Error)]
pub enum DiarizationError {
    #[error("model not loaded")]
    ModelNotLoaded,
    #[error("processing error: {0}")]
    ProcessingError(String),
    #[error("invalid segment: {0}")]
    InvalidSegment(String),
    #[error("segments overlap: {first:?} and {second:?}")]
    OverlappingSegments { first: (f64, f64), second: (f64, f64) },
    #[error("low quality result: {0}")]
    LowQuality(String),
}

pub type Result<T> = std::result::Result<T, DiarizationError>;
