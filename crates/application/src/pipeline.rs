//! End-to-end processing of one recording into a word database.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local, TimeZone, Utc};
use palabra_audio::{AudioError, ClipExtractor, ProcessedAudio};
use palabra_config::Config;
use palabra_diarization::{DiarizationProcessor, Diarizer};
use palabra_entities::{base_metadata, WordDatabase};
use palabra_storage::{JsonStore, StoreOptions, WriteReport};
use palabra_stt::{SttEngine, SttError, WordHypothesis, STT_SAMPLE_RATE};
use serde_json::json;

use crate::adjacency::{AdjacencyAnalyzer, AdjacencyReport};
use crate::entity_creation::EntityCreator;
use crate::error::{EntityError, PipelineError, Result, Stage, TranscriptionError};
use crate::quality_filter::QualityFilter;
use crate::speakers::{SpeakerMapping, SpeakerResolver};

/// Per-run inputs beyond the configuration.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    /// Database destination. Defaults to `output.database_path`.
    pub output_path: Option<PathBuf>,
    /// JSON speaker mapping file (interval list or range object).
    pub speaker_map: Option<PathBuf>,
    /// Overrides `output.clips_dir`.
    pub clips_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub database: WordDatabase,
    pub adjacency: AdjacencyReport,
    pub write: WriteReport,
    pub hypotheses: usize,
    pub skipped: usize,
    pub clips_written: usize,
}

/// `rec_<stem>_<YYYYmmdd_HHMMSS>`, with spaces and dashes in the stem as `_`.
pub fn recording_id<Tz>(audio_path: &Path, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stem = audio_path
        .file_stem()
        .map(|s| s.to_string_lossy().replace([' ', '-'], "_"))
        .unwrap_or_else(|| "recording".to_string());
    format!("rec_{stem}_{}", now.format("%Y%m%d_%H%M%S"))
}

struct StageTimer {
    stage: Stage,
    started: Instant,
}

impl StageTimer {
    fn start(stage: Stage) -> Self {
        tracing::info!(stage = stage.as_str(), "stage_started");
        Self {
            stage,
            started: Instant::now(),
        }
    }

    fn finish(self) {
        tracing::info!(
            stage = self.stage.as_str(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "stage_completed"
        );
    }
}

pub struct Pipeline {
    config: Config,
    engine: Box<dyn SttEngine>,
    diarization: DiarizationProcessor,
}

impl Pipeline {
    pub fn new(config: Config, engine: Box<dyn SttEngine>) -> Self {
        let diarization = DiarizationProcessor::new(&config.diarization, None);
        Self {
            config,
            engine,
            diarization,
        }
    }

    /// Attach a diarization backend. Only used when
    /// `speakers.enable_diarization` is set.
    pub fn with_diarizer(mut self, diarizer: Box<dyn Diarizer>) -> Self {
        self.diarization = DiarizationProcessor::new(&self.config.diarization, Some(diarizer));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn process(&self, audio_path: &Path, request: &ProcessRequest) -> Result<PipelineOutput> {
        let run_started = Instant::now();
        let path = audio_path.to_path_buf();
        let recording_id = recording_id(audio_path, &Local::now());
        tracing::info!(
            audio = %audio_path.display(),
            recording_id = %recording_id,
            engine = self.engine.model_name(),
            "pipeline_started"
        );

        let timer = StageTimer::start(Stage::Audio);
        let audio = ProcessedAudio::load(audio_path, &self.config.audio).map_err(|source| {
            PipelineError::Audio {
                path: path.clone(),
                source,
            }
        })?;
        timer.finish();

        let timer = StageTimer::start(Stage::Transcription);
        let hypotheses = self
            .transcribe(&audio)
            .map_err(|source| PipelineError::Transcription {
                path: path.clone(),
                source,
            })?;
        timer.finish();

        let diarization = if self.config.speakers.enable_diarization {
            let timer = StageTimer::start(Stage::Diarization);
            let result = self.diarization.process(audio_path, audio.duration());
            timer.finish();
            Some(result)
        } else {
            None
        };

        let mapping = request
            .speaker_map
            .as_deref()
            .map(SpeakerMapping::load)
            .transpose()
            .map_err(|source| PipelineError::Speaker {
                path: path.clone(),
                source,
            })?;
        let resolver = SpeakerResolver::new(diarization, mapping, &self.config.speakers);
        tracing::info!(source = resolver.source().name(), "speaker_source_selected");

        let timer = StageTimer::start(Stage::Entities);
        let creator =
            EntityCreator::new(&recording_id, audio_path.to_string_lossy(), &resolver);
        let batch = creator
            .create_all(&hypotheses)
            .map_err(|source| PipelineError::Entity {
                path: path.clone(),
                source,
            })?;
        timer.finish();

        let timer = StageTimer::start(Stage::Filtering);
        let entities = QualityFilter::new(&self.config.quality).apply(batch.entities);
        timer.finish();

        let timer = StageTimer::start(Stage::Speakers);
        let speaker_map = resolver.speaker_map(&entities);
        tracing::info!(speakers_assigned = speaker_map.len(), "speaker_mapping_completed");
        timer.finish();

        let metadata = self.metadata(&audio, entities.len());
        let mut database = WordDatabase::new(metadata, speaker_map, entities).map_err(|e| {
            PipelineError::Entity {
                path: path.clone(),
                source: EntityError::Construction(e.to_string()),
            }
        })?;

        let timer = StageTimer::start(Stage::Adjacency);
        let adjacency = AdjacencyAnalyzer::new(&self.config.buffering).analyze(database.entities());
        database.insert_metadata("zero_gap_pairs", adjacency.zero_gap_pairs);
        database.insert_metadata("overlap_pairs", adjacency.overlap_pairs);
        database.insert_metadata("normal_gap_pairs", adjacency.normal_gap_pairs);
        timer.finish();

        let clips_dir = request
            .clips_dir
            .as_ref()
            .or(self.config.output.clips_dir.as_ref());
        let clips_written = match clips_dir {
            Some(dir) => {
                let timer = StageTimer::start(Stage::Clips);
                let written = extract_clips(dir, &audio, &mut database, &adjacency)
                    .map_err(|source| PipelineError::Clips {
                        path: path.clone(),
                        source,
                    })?;
                timer.finish();
                written
            }
            None => 0,
        };

        let timer = StageTimer::start(Stage::Database);
        let output_path = request
            .output_path
            .clone()
            .unwrap_or_else(|| self.config.output.database_path.clone());
        let store = JsonStore::new(output_path, StoreOptions::from(&self.config.output));
        let write = store
            .write(&database)
            .map_err(|source| PipelineError::Database {
                path: path.clone(),
                source,
            })?;
        timer.finish();

        tracing::info!(
            entities = database.entities().len(),
            output = %write.path.display(),
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            "pipeline_completed"
        );

        Ok(PipelineOutput {
            database,
            adjacency,
            write,
            hypotheses: hypotheses.len(),
            skipped: batch.skipped.len(),
            clips_written,
        })
    }

    /// Run the engine and drop blank hypotheses. No words at all is an error.
    fn transcribe(
        &self,
        audio: &ProcessedAudio,
    ) -> std::result::Result<Vec<WordHypothesis>, TranscriptionError> {
        let result = if audio.sample_rate() == STT_SAMPLE_RATE {
            self.engine.transcribe(audio.samples())
        } else {
            self.engine.transcribe_file(&audio.metadata().path)
        };
        let hypotheses = result.map_err(|e| match e {
            SttError::ModelNotLoaded => TranscriptionError::NoModelLoaded,
            other => TranscriptionError::TranscriptionFailed(other.to_string()),
        })?;

        let received = hypotheses.len();
        let words: Vec<WordHypothesis> = hypotheses
            .into_iter()
            .filter(|h| !h.text.trim().is_empty())
            .collect();
        tracing::info!(
            received,
            kept = words.len(),
            model = self.engine.model_name(),
            "transcription_completed"
        );

        if words.is_empty() {
            return Err(TranscriptionError::NoWordsExtracted);
        }
        Ok(words)
    }

    fn metadata(
        &self,
        audio: &ProcessedAudio,
        entity_count: usize,
    ) -> serde_json::Map<String, serde_json::Value> {
        let quality = &self.config.quality;
        let mut metadata = base_metadata(Utc::now());
        metadata.insert("whisper_model".into(), json!(self.config.whisper.model.as_str()));
        metadata.insert("language".into(), json!(self.config.whisper.language));
        metadata.insert("stt_engine".into(), json!(self.engine.model_name()));
        metadata.insert("audio_duration".into(), json!(audio.duration()));
        metadata.insert("audio_sample_rate".into(), json!(audio.metadata().sample_rate));
        metadata.insert("entity_count".into(), json!(entity_count));
        metadata.insert(
            "config_snapshot".into(),
            json!({
                "min_confidence": quality.min_confidence,
                "min_word_duration": quality.min_word_duration,
                "max_word_duration": quality.max_word_duration,
                "syllable_range": quality.syllable_range,
            }),
        );
        metadata
    }
}

fn extract_clips(
    dir: &Path,
    audio: &ProcessedAudio,
    database: &mut WordDatabase,
    adjacency: &AdjacencyReport,
) -> palabra_audio::Result<usize> {
    let extractor = ClipExtractor::new(dir)?;
    let mut written = 0;
    for (index, entity) in database.entities_mut().iter_mut().enumerate() {
        let window = adjacency.windows[index];
        match extractor.extract(audio, entity, window, adjacency.selection_reason(index)) {
            Ok(_) => written += 1,
            Err(AudioError::OutsideRecording { entity_id, duration }) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    audio_duration = duration,
                    "clip_outside_recording"
                );
            }
            Err(e) => return Err(e),
        }
    }
    tracing::info!(
        clips = written,
        dir = %extractor.output_dir().display(),
        "clips_extracted"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_id_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            recording_id(Path::new("/data/entrevista bogotá-02.wav"), &now),
            "rec_entrevista_bogotá_02_20240309_140507"
        );
        assert_eq!(
            recording_id(Path::new("clip.wav"), &now),
            "rec_clip_20240309_140507"
        );
    }
}
