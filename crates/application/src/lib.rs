//! Core of the palabra pipeline: turns word hypotheses from a transcription
//! engine into filtered, speaker-attributed word entities.

mod adjacency;
mod analysis;
mod constants;
mod entity_creation;
mod error;
mod pipeline;
mod quality_filter;
mod scoring;
mod speakers;
mod syllables;

pub use adjacency::{AdjacencyAnalyzer, AdjacencyReport, AdjacentPair, GapKind};
pub use analysis::{relabel_speakers, summarize_speakers, SpeakerSummary};
pub use constants::*;
pub use entity_creation::{
    clean_text, entity_id_for, CreationBatch, EntityCreator, SkipReason, SkippedHypothesis,
};
pub use error::{
    EntityError, PipelineError, Result, SpeakerError, Stage, TranscriptionError,
};
pub use pipeline::{recording_id, Pipeline, PipelineOutput, ProcessRequest};
pub use quality_filter::QualityFilter;
pub use scoring::QualityScorer;
pub use speakers::{
    parse_speaker_label, SpeakerInterval, SpeakerMapping, SpeakerResolver, SpeakerSource,
};
pub use syllables::SyllableEstimator;
