//! Process exit codes, one per error category.

use palabra_application::{PipelineError, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Invalid arguments or configuration
    InvalidArguments = 2,
    AudioError = 3,
    TranscriptionError = 4,
    EntityError = 5,
    DatabaseError = 6,
    /// Malformed speaker mapping or label
    SpeakerError = 7,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn for_pipeline_error(error: &PipelineError) -> Self {
        match error.stage() {
            Stage::Audio | Stage::Clips => ExitCode::AudioError,
            Stage::Transcription => ExitCode::TranscriptionError,
            Stage::Entities => ExitCode::EntityError,
            Stage::Speakers => ExitCode::SpeakerError,
            Stage::Database => ExitCode::DatabaseError,
            Stage::Diarization | Stage::Filtering | Stage::Adjacency => ExitCode::GeneralError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::AudioError => write!(f, "audio error"),
            ExitCode::TranscriptionError => write!(f, "transcription error"),
            ExitCode::EntityError => write!(f, "entity error"),
            ExitCode::DatabaseError => write!(f, "database error"),
            ExitCode::SpeakerError => write!(f, "speaker mapping error"),
        }
    }
}
