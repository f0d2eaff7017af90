use std::fmt;
use std::path::PathBuf;

use palabra_audio::AudioError;
use palabra_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("no model loaded")]
    NoModelLoaded,
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("no words extracted from audio")]
    NoWordsExtracted,
}

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("all {rejected} word hypotheses were rejected")]
    AllRejected { rejected: usize },
    #[error("entity construction failed: {0}")]
    Construction(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SpeakerError {
    #[error("failed to read speaker mapping {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid speaker mapping: {0}")]
    InvalidMapping(String),
    #[error("invalid speaker label '{0}', expected ID=NAME[:GENDER[:REGION]]")]
    InvalidLabel(String),
}

/// Pipeline stages, used for error context and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Audio,
    Transcription,
    Diarization,
    Entities,
    Speakers,
    Filtering,
    Adjacency,
    Clips,
    Database,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Audio => "audio",
            Stage::Transcription => "transcription",
            Stage::Diarization => "diarization",
            Stage::Entities => "entities",
            Stage::Speakers => "speakers",
            Stage::Filtering => "filtering",
            Stage::Adjacency => "adjacency",
            Stage::Clips => "clips",
            Stage::Database => "database",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-level failure of a pipeline run, carrying the recording path.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("audio stage failed for {}: {source}", path.display())]
    Audio {
        path: PathBuf,
        #[source]
        source: AudioError,
    },
    #[error("transcription stage failed for {}: {source}", path.display())]
    Transcription {
        path: PathBuf,
        #[source]
        source: TranscriptionError,
    },
    #[error("entity stage failed for {}: {source}", path.display())]
    Entity {
        path: PathBuf,
        #[source]
        source: EntityError,
    },
    #[error("speaker stage failed for {}: {source}", path.display())]
    Speaker {
        path: PathBuf,
        #[source]
        source: SpeakerError,
    },
    #[error("clip extraction failed for {}: {source}", path.display())]
    Clips {
        path: PathBuf,
        #[source]
        source: AudioError,
    },
    #[error("database stage failed for {}: {source}", path.display())]
    Database {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Audio { .. } => Stage::Audio,
            PipelineError::Transcription { .. } => Stage::Transcription,
            PipelineError::Entity { .. } => Stage::Entities,
            PipelineError::Speaker { .. } => Stage::Speakers,
            PipelineError::Clips { .. } => Stage::Clips,
            PipelineError::Database { .. } => Stage::Database,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
