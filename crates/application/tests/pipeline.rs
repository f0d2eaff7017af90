//! End-to-end pipeline runs against generated WAV files.
//!
//! Transcription is replayed from fixed word lists so no model is needed.

use std::path::{Path, PathBuf};

use palabra_application::{
    EntityError, GapKind, Pipeline, PipelineError, ProcessRequest, Stage, TranscriptionError,
};
use palabra_config::Config;
use palabra_diarization::{DiarizationError, Diarizer, SpeakerCountHint, SpeakerTurn};
use palabra_entities::Entity;
use palabra_storage::{JsonStore, StoreOptions};
use palabra_stt::{ReplayEngine, SttEngine, SttError, WordHypothesis};
use tempfile::tempdir;

const SAMPLE_RATE: u32 = 16000;

fn write_tone(path: &Path, seconds: f64, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let total = (seconds * sample_rate as f64) as usize;
    for i in 0..total {
        let t = i as f64 / sample_rate as f64;
        let sample = (t * 220.0 * std::f64::consts::TAU).sin() * 0.3;
        writer.write_sample((sample * i16::MAX as f64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn word(text: &str, start: f64, end: f64, confidence: f64) -> WordHypothesis {
    WordHypothesis::new(text, start, end, confidence)
}

/// hola | como touch; como -> gracias is a normal gap; the rest is filtered.
fn spoken_words() -> Vec<WordHypothesis> {
    vec![
        word("Hola,", 0.5, 1.0, 0.95),
        word("como", 1.0, 1.4, 0.9),
        word("que", 1.5, 1.7, 0.4),
        word("", 1.8, 1.9, 0.9),
        word("gracias", 2.0, 2.6, 0.92),
        word("tal", 3.0, 3.4, 0.88),
    ]
}

fn replay(words: Vec<WordHypothesis>) -> Box<dyn SttEngine> {
    Box::new(ReplayEngine::new(words))
}

struct Fixture {
    _dir: tempfile::TempDir,
    audio: PathBuf,
    output: PathBuf,
    root: PathBuf,
}

fn fixture(seconds: f64) -> Fixture {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let audio = root.join("entrevista medellín-01.wav");
    write_tone(&audio, seconds, SAMPLE_RATE);
    Fixture {
        output: root.join("out").join("words.json"),
        audio,
        root,
        _dir: dir,
    }
}

fn request(fx: &Fixture) -> ProcessRequest {
    ProcessRequest {
        output_path: Some(fx.output.clone()),
        ..ProcessRequest::default()
    }
}

fn texts(entities: &[Entity]) -> Vec<&str> {
    entities.iter().map(Entity::text).collect()
}

// =============================================================================
// Happy path
// =============================================================================

mod happy_path {
    use super::*;

    #[test]
    fn test_process_writes_filtered_database() {
        let fx = fixture(5.0);
        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));

        let output = pipeline.process(&fx.audio, &request(&fx)).unwrap();

        assert_eq!(output.hypotheses, 5, "blank hypothesis dropped");
        assert_eq!(output.skipped, 0);
        assert_eq!(texts(output.database.entities()), vec!["Hola", "como", "gracias", "tal"]);

        let ids: Vec<_> = output.database.entities().iter().map(Entity::entity_id).collect();
        assert_eq!(ids, vec!["word_001", "word_002", "word_004", "word_005"]);

        let stored = JsonStore::new(&fx.output, StoreOptions::default()).read().unwrap();
        assert_eq!(stored.entities().len(), 4);
        let metadata = stored.metadata();
        assert_eq!(metadata["version"], "1.0");
        assert_eq!(metadata["entity_count"], 4);
        assert_eq!(metadata["language"], "es");
        assert_eq!(metadata["whisper_model"], "base");
        assert_eq!(metadata["audio_sample_rate"], SAMPLE_RATE);
        assert_eq!(metadata["config_snapshot"]["min_confidence"], 0.8);
        assert_eq!(metadata["zero_gap_pairs"], 1);
        assert_eq!(metadata["normal_gap_pairs"], 2);
        assert_eq!(metadata["overlap_pairs"], 0);
    }

    #[test]
    fn test_entities_record_recording() {
        let fx = fixture(5.0);
        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let output = pipeline.process(&fx.audio, &request(&fx)).unwrap();

        let first = &output.database.entities()[0];
        assert!(first.recording_id().starts_with("rec_entrevista_medellín_01_"));
        assert_eq!(first.recording_path(), fx.audio.to_string_lossy());
        assert_eq!(first.speaker_id(), 0);
        assert_eq!(output.database.speaker_map()[&0].name, "Default Speaker");
    }

    #[test]
    fn test_adjacency_report() {
        let fx = fixture(5.0);
        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let output = pipeline.process(&fx.audio, &request(&fx)).unwrap();

        let kinds: Vec<_> = output.adjacency.pairs.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![GapKind::ZeroGap, GapKind::Normal, GapKind::Normal]);
        assert_eq!(output.adjacency.windows[0].trail, 0.0);
        assert_eq!(output.adjacency.windows[1].lead, 0.0);
    }

    #[test]
    fn test_resampled_input_keeps_source_metadata() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("grabacion.wav");
        write_tone(&audio, 4.0, 44100);

        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let output = pipeline
            .process(
                &audio,
                &ProcessRequest {
                    output_path: Some(dir.path().join("words.json")),
                    ..ProcessRequest::default()
                },
            )
            .unwrap();
        assert_eq!(output.database.metadata()["audio_sample_rate"], 44100);
        assert!((output.database.metadata()["audio_duration"].as_f64().unwrap() - 4.0).abs() < 0.01);
    }
}

// =============================================================================
// Speakers
// =============================================================================

mod speakers {
    use super::*;

    struct FixedTurns;

    impl Diarizer for FixedTurns {
        fn name(&self) -> &str {
            "fixed"
        }

        fn process(
            &self,
            _audio_path: &Path,
            _hint: SpeakerCountHint,
        ) -> palabra_diarization::Result<Vec<SpeakerTurn>> {
            Ok(vec![
                SpeakerTurn {
                    label: "SPEAKER_00".into(),
                    start: 0.0,
                    end: 1.9,
                    confidence: Some(0.9),
                },
                SpeakerTurn {
                    label: "SPEAKER_01".into(),
                    start: 1.9,
                    end: 5.0,
                    confidence: Some(0.9),
                },
            ])
        }
    }

    struct BrokenDiarizer;

    impl Diarizer for BrokenDiarizer {
        fn name(&self) -> &str {
            "broken"
        }

        fn process(
            &self,
            _audio_path: &Path,
            _hint: SpeakerCountHint,
        ) -> palabra_diarization::Result<Vec<SpeakerTurn>> {
            Err(DiarizationError::ProcessingError("model crashed".into()))
        }
    }

    fn diarizing_config() -> Config {
        let mut config = Config::default();
        config.speakers.enable_diarization = true;
        config
    }

    #[test]
    fn test_interval_speaker_map_file() {
        let fx = fixture(5.0);
        let map = fx.root.join("speakers.json");
        std::fs::write(
            &map,
            r#"[
                {"start": 0.0, "end": 1.9, "speaker_id": 1, "speaker": "Lucía", "gender": "F"},
                {"start": 1.9, "end": 10.0, "speaker_id": 2}
            ]"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let output = pipeline
            .process(
                &fx.audio,
                &ProcessRequest {
                    speaker_map: Some(map),
                    ..request(&fx)
                },
            )
            .unwrap();

        let speakers: Vec<_> = output.database.entities().iter().map(Entity::speaker_id).collect();
        assert_eq!(speakers, vec![1, 1, 2, 2]);
        assert_eq!(output.database.speaker_map()[&1].name, "Lucía");
        assert_eq!(output.database.speaker_map()[&2].name, "Unknown Speaker");
    }

    #[test]
    fn test_range_speaker_map_file() {
        let fx = fixture(5.0);
        let map = fx.root.join("ranges.json");
        std::fs::write(&map, r#"{"0.0-2.0": "speaker_3", "bad": "speaker_4"}"#).unwrap();

        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let output = pipeline
            .process(
                &fx.audio,
                &ProcessRequest {
                    speaker_map: Some(map),
                    ..request(&fx)
                },
            )
            .unwrap();

        let speakers: Vec<_> = output.database.entities().iter().map(Entity::speaker_id).collect();
        assert_eq!(speakers, vec![3, 3, 0, 0]);
        assert_eq!(output.database.speaker_map()[&3].name, "Speaker 3");
    }

    #[test]
    fn test_diarization_overrides_mapping() {
        let fx = fixture(5.0);
        let map = fx.root.join("ranges.json");
        std::fs::write(&map, r#"{"0.0-5.0": "speaker_7"}"#).unwrap();

        let pipeline = Pipeline::new(diarizing_config(), replay(spoken_words()))
            .with_diarizer(Box::new(FixedTurns));
        let output = pipeline
            .process(
                &fx.audio,
                &ProcessRequest {
                    speaker_map: Some(map),
                    ..request(&fx)
                },
            )
            .unwrap();

        let speakers: Vec<_> = output.database.entities().iter().map(Entity::speaker_id).collect();
        assert_eq!(speakers, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_diarization_failure_falls_back_to_single_speaker() {
        let fx = fixture(5.0);
        let pipeline = Pipeline::new(diarizing_config(), replay(spoken_words()))
            .with_diarizer(Box::new(BrokenDiarizer));
        let output = pipeline.process(&fx.audio, &request(&fx)).unwrap();

        assert!(output.database.entities().iter().all(|e| e.speaker_id() == 0));
        assert_eq!(output.database.speaker_map().len(), 1);
    }

    #[test]
    fn test_malformed_speaker_map_is_speaker_error() {
        let fx = fixture(5.0);
        let map = fx.root.join("speakers.json");
        std::fs::write(&map, r#""speaker_1""#).unwrap();

        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let err = pipeline
            .process(
                &fx.audio,
                &ProcessRequest {
                    speaker_map: Some(map),
                    ..request(&fx)
                },
            )
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Speakers);
    }
}

// =============================================================================
// Clips
// =============================================================================

mod clips {
    use super::*;

    #[test]
    fn test_clips_extracted_with_buffer_plan() {
        let fx = fixture(5.0);
        let clips_dir = fx.root.join("clips");
        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let output = pipeline
            .process(
                &fx.audio,
                &ProcessRequest {
                    clips_dir: Some(clips_dir.clone()),
                    ..request(&fx)
                },
            )
            .unwrap();

        assert_eq!(output.clips_written, 4);
        assert_eq!(std::fs::read_dir(&clips_dir).unwrap().count(), 4);
        let first = &output.database.entities()[0];
        assert!(first.is_processed());
        assert_eq!(first.selection_reason(), Some("partially_buffered"));

        let stored = JsonStore::new(&fx.output, StoreOptions::default()).read().unwrap();
        assert!(stored.entities().iter().all(Entity::is_processed));
        assert!(stored.entities()[3].clip_path().unwrap().ends_with(".wav"));
    }

    #[test]
    fn test_word_past_end_of_audio_is_left_unextracted() {
        let fx = fixture(2.0);
        let clips_dir = fx.root.join("clips");
        let words = vec![
            word("Hola", 0.5, 1.0, 0.95),
            word("como", 1.0, 1.4, 0.9),
            word("gracias", 2.5, 3.0, 0.92),
        ];
        let pipeline = Pipeline::new(Config::default(), replay(words));
        let output = pipeline
            .process(
                &fx.audio,
                &ProcessRequest {
                    clips_dir: Some(clips_dir.clone()),
                    ..request(&fx)
                },
            )
            .unwrap();

        assert_eq!(output.clips_written, 2);
        assert_eq!(std::fs::read_dir(&clips_dir).unwrap().count(), 2);

        let stored = JsonStore::new(&fx.output, StoreOptions::default()).read().unwrap();
        assert_eq!(texts(stored.entities()), vec!["Hola", "como", "gracias"]);
        assert!(stored.entities()[0].is_processed());
        assert!(stored.entities()[1].is_processed());
        let late = &stored.entities()[2];
        assert!(!late.is_processed());
        assert!(late.clip_path().is_none());
    }
}

// =============================================================================
// Failures
// =============================================================================

mod failures {
    use super::*;

    struct FailingEngine;

    impl SttEngine for FailingEngine {
        fn transcribe(&self, _audio: &[f32]) -> palabra_stt::Result<Vec<WordHypothesis>> {
            Err(SttError::TranscriptionFailed("decoder exploded".into()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_missing_audio_is_audio_error() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(Config::default(), replay(spoken_words()));
        let err = pipeline
            .process(&dir.path().join("missing.wav"), &ProcessRequest::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Audio { .. }));
        assert_eq!(err.stage(), Stage::Audio);
    }

    #[test]
    fn test_no_words_is_transcription_error() {
        let fx = fixture(1.0);
        let pipeline = Pipeline::new(
            Config::default(),
            replay(vec![word(" ", 0.1, 0.2, 0.9)]),
        );
        let err = pipeline.process(&fx.audio, &request(&fx)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transcription {
                source: TranscriptionError::NoWordsExtracted,
                ..
            }
        ));
        assert!(!fx.output.exists());
    }

    #[test]
    fn test_engine_failure_is_transcription_error() {
        let fx = fixture(1.0);
        let pipeline = Pipeline::new(Config::default(), Box::new(FailingEngine));
        let err = pipeline.process(&fx.audio, &request(&fx)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transcription {
                source: TranscriptionError::TranscriptionFailed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_all_hypotheses_rejected_is_entity_error() {
        let fx = fixture(1.0);
        let pipeline = Pipeline::new(
            Config::default(),
            replay(vec![word("hola", 0.5, 0.5, 0.9), word("...", 0.6, 0.8, 0.9)]),
        );
        let err = pipeline.process(&fx.audio, &request(&fx)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Entity {
                source: EntityError::AllRejected { rejected: 2 },
                ..
            }
        ));
    }

    #[test]
    fn test_everything_filtered_still_writes_database() {
        let fx = fixture(1.0);
        let pipeline = Pipeline::new(
            Config::default(),
            replay(vec![word("hola", 0.1, 0.6, 0.3)]),
        );
        let output = pipeline.process(&fx.audio, &request(&fx)).unwrap();
        assert!(output.database.entities().is_empty());
        assert_eq!(output.database.speaker_map().len(), 1);
        assert!(fx.output.exists());
    }
}
