//! CLI command implementations.

use std::path::{Path, PathBuf};

use palabra_application::{
    parse_speaker_label, relabel_speakers, summarize_speakers, AdjacencyAnalyzer, Pipeline,
    ProcessRequest,
};
use palabra_config::Config;
use palabra_diarization::RttmDiarizer;
use palabra_storage::{JsonStore, StoreOptions};
use palabra_stt::{ReplayEngine, SttEngine};
use serde_json::json;

use crate::exit_codes::ExitCode;
use crate::ProcessArgs;

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn fail(code: ExitCode, message: impl std::fmt::Display) -> ExitCode {
    tracing::error!(exit_code = code.as_i32(), error = %message, "command_failed");
    eprintln!("error: {message}");
    code
}

/// Configured ggml model, else `models/ggml-<size>.bin`.
fn whisper_model_path(config: &Config) -> PathBuf {
    config.whisper.model_path.clone().unwrap_or_else(|| {
        PathBuf::from(format!("models/ggml-{}.bin", config.whisper.model.as_str()))
    })
}

#[cfg(feature = "whisper")]
fn whisper_engine(config: &Config) -> Result<Box<dyn SttEngine>, String> {
    let path = whisper_model_path(config);
    palabra_stt::WhisperEngine::new(&path, &config.whisper.language, config.whisper.temperature)
        .map(|engine| Box::new(engine) as Box<dyn SttEngine>)
        .map_err(|e| format!("failed to load whisper model {}: {e}", path.display()))
}

#[cfg(not(feature = "whisper"))]
fn whisper_engine(_config: &Config) -> Result<Box<dyn SttEngine>, String> {
    Err("this build has no whisper support; pass --transcript or rebuild with --features whisper"
        .to_string())
}

fn engine_for(args: &ProcessArgs, config: &Config) -> Result<Box<dyn SttEngine>, String> {
    match &args.transcript {
        Some(path) => ReplayEngine::from_file(path)
            .map(|engine| Box::new(engine) as Box<dyn SttEngine>)
            .map_err(|e| e.to_string()),
        None => whisper_engine(config),
    }
}

/// Extract words from one recording.
pub fn process(args: ProcessArgs, mut config: Config, json: bool) -> ExitCode {
    if let Some(language) = &args.language {
        config.whisper.language = language.clone();
    }
    if args.diarize {
        config.speakers.enable_diarization = true;
    }
    if let Err(e) = config.validate() {
        return fail(ExitCode::InvalidArguments, e);
    }

    let engine = match engine_for(&args, &config) {
        Ok(engine) => engine,
        Err(message) => return fail(ExitCode::TranscriptionError, message),
    };

    let diarizer = if config.speakers.enable_diarization {
        RttmDiarizer::sibling_of(&args.audio_file)
    } else {
        None
    };
    if config.speakers.enable_diarization && diarizer.is_none() {
        tracing::warn!(
            audio = %args.audio_file.display(),
            "no diarization output found next to the recording"
        );
    }

    let mut pipeline = Pipeline::new(config, engine);
    if let Some(diarizer) = diarizer {
        pipeline = pipeline.with_diarizer(Box::new(diarizer));
    }

    let request = ProcessRequest {
        output_path: Some(
            args.output
                .clone()
                .unwrap_or_else(|| args.audio_file.with_extension("json")),
        ),
        speaker_map: args.speaker_map.clone(),
        clips_dir: args.clips_dir.clone(),
    };

    let output = match pipeline.process(&args.audio_file, &request) {
        Ok(output) => output,
        Err(e) => return fail(ExitCode::for_pipeline_error(&e), e),
    };

    if json {
        print_json(&json!({
            "database": output.write.path,
            "backup": output.write.backup,
            "hypotheses": output.hypotheses,
            "skipped": output.skipped,
            "entities": output.database.entities().len(),
            "speakers": output.database.speaker_map().len(),
            "clips": output.clips_written,
            "adjacency": output.adjacency,
        }));
    } else {
        println!(
            "Wrote {} words ({} hypotheses, {} skipped) to {}",
            output.database.entities().len(),
            output.hypotheses,
            output.skipped,
            output.write.path.display()
        );
        if let Some(backup) = &output.write.backup {
            println!("Previous database backed up to {}", backup.display());
        }
        println!(
            "Boundaries: {} zero-gap, {} overlap, {} normal",
            output.adjacency.zero_gap_pairs,
            output.adjacency.overlap_pairs,
            output.adjacency.normal_gap_pairs
        );
        if output.clips_written > 0 {
            println!("Extracted {} clips", output.clips_written);
        }
    }
    ExitCode::Success
}

fn open_store(path: &Path, config: &Config) -> JsonStore {
    JsonStore::new(path, StoreOptions::from(&config.output))
}

/// Rewrite speaker map entries of an existing database.
pub fn label_speakers(database: &Path, labels: &[String], config: &Config, json: bool) -> ExitCode {
    let mut parsed = Vec::with_capacity(labels.len());
    for label in labels {
        match parse_speaker_label(label) {
            Ok(entry) => parsed.push(entry),
            Err(e) => return fail(ExitCode::SpeakerError, e),
        }
    }

    let store = open_store(database, config);
    let mut db = match store.read() {
        Ok(db) => db,
        Err(e) => return fail(ExitCode::DatabaseError, e),
    };
    let changed = relabel_speakers(&mut db, parsed);
    if let Err(e) = store.write(&db) {
        return fail(ExitCode::DatabaseError, e);
    }

    if json {
        print_json(&json!({ "database": database, "speaker_map": db.speaker_map() }));
    } else {
        println!("Updated {changed} speaker labels in {}", database.display());
        for (id, info) in db.speaker_map() {
            println!("  {id}: {} ({}, {})", info.name, info.gender, info.region);
        }
    }
    ExitCode::Success
}

/// Per-speaker statistics plus the word boundary report.
pub fn analyze_speakers(database: &Path, config: &Config, json: bool) -> ExitCode {
    let db = match open_store(database, config).read() {
        Ok(db) => db,
        Err(e) => return fail(ExitCode::DatabaseError, e),
    };
    let summaries = summarize_speakers(&db);
    let adjacency = AdjacencyAnalyzer::new(&config.buffering).analyze(db.entities());

    if json {
        print_json(&json!({
            "speakers": summaries,
            "adjacency": {
                "pairs": adjacency.total_pairs(),
                "zero_gap_pairs": adjacency.zero_gap_pairs,
                "overlap_pairs": adjacency.overlap_pairs,
                "normal_gap_pairs": adjacency.normal_gap_pairs,
                "zero_gap_percentage": adjacency.zero_gap_percentage(),
            },
        }));
        return ExitCode::Success;
    }

    println!(
        "{:<4}  {:<24}  {:>6}  {:>8}  {:>8}  {:>9}",
        "ID", "NAME", "WORDS", "CONF", "QUALITY", "SPEECH(s)"
    );
    for s in &summaries {
        println!(
            "{:<4}  {:<24}  {:>6}  {:>8.3}  {:>8.3}  {:>9.2}",
            s.speaker_id, s.name, s.entity_count, s.mean_confidence, s.mean_quality, s.speech_time
        );
    }
    println!();
    println!(
        "Word pairs: {} ({} zero-gap, {:.1}%; {} overlap; {} normal)",
        adjacency.total_pairs(),
        adjacency.zero_gap_pairs,
        adjacency.zero_gap_percentage(),
        adjacency.overlap_pairs,
        adjacency.normal_gap_pairs
    );
    ExitCode::Success
}

/// Show the effective configuration and engine availability.
pub fn info(config: &Config, check_dependencies: bool, json: bool) -> ExitCode {
    let model_path = whisper_model_path(config);
    let whisper_built = palabra_stt::whisper_available();
    let model_found = model_path.exists();

    if json {
        print_json(&json!({
            "version": env!("CARGO_PKG_VERSION"),
            "whisper": {
                "available": whisper_built,
                "model": config.whisper.model.as_str(),
                "model_path": model_path,
                "model_found": model_found,
                "language": config.whisper.language,
            },
            "diarization": {
                "enabled": config.speakers.enable_diarization,
                "backend": "rttm",
            },
            "quality": config.quality,
            "buffering": config.buffering,
            "output": config.output,
        }));
    } else {
        println!("palabra {}", env!("CARGO_PKG_VERSION"));
        println!(
            "Whisper: {} (model {}, {})",
            if whisper_built { "built in" } else { "not built" },
            config.whisper.model,
            model_path.display()
        );
        println!("Language: {}", config.whisper.language);
        println!(
            "Diarization: {} (RTTM files next to recordings)",
            if config.speakers.enable_diarization { "enabled" } else { "disabled" }
        );
        println!(
            "Quality: confidence >= {}, duration {}-{}s, syllables {}-{}",
            config.quality.min_confidence,
            config.quality.min_word_duration,
            config.quality.max_word_duration,
            config.quality.syllable_range[0],
            config.quality.syllable_range[1]
        );
        println!(
            "Buffering: {}ms, zero-gap tolerance {}s",
            config.buffering.buffer_ms, config.buffering.zero_gap_tolerance
        );
        println!("Database: {}", config.output.database_path.display());
    }

    if check_dependencies {
        if !whisper_built {
            eprintln!("warning: whisper support not compiled in; only --transcript is usable");
        } else if !model_found {
            return fail(
                ExitCode::GeneralError,
                format!("whisper model not found at {}", model_path.display()),
            );
        }
    }
    ExitCode::Success
}

pub fn version(json: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        println!(r#"{{"version": "{}"}}"#, version);
    } else {
        println!("palabra {}", version);
    }
}
