use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Instant;

use palabra_config::DiarizationConfig;

use crate::segment::{DiarizationResult, SpeakerSegment};
use crate::{DiarizationError, Result};

/// Confidence assigned when a backend reports none.
pub const DEFAULT_TURN_CONFIDENCE: f64 = 0.85;

/// One labelled speaker turn as reported by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerTurn {
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub confidence: Option<f64>,
}

/// Bounds forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakerCountHint {
    pub min: u32,
    pub max: u32,
}

pub trait Diarizer: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, audio_path: &Path, hint: SpeakerCountHint) -> Result<Vec<SpeakerTurn>>;
}

/// Runs a [`Diarizer`] and turns its output into a validated
/// [`DiarizationResult`], substituting a single speaker whenever anything
/// goes wrong.
pub struct DiarizationProcessor {
    config: DiarizationConfig,
    backend: Option<Box<dyn Diarizer>>,
}

impl DiarizationProcessor {
    pub fn new(config: &DiarizationConfig, backend: Option<Box<dyn Diarizer>>) -> Self {
        tracing::info!(
            model = %config.model,
            min_speakers = config.min_speakers,
            max_speakers = config.max_speakers,
            backend = backend.as_ref().map(|b| b.name()).unwrap_or("none"),
            "diarization_processor_initialized"
        );
        Self {
            config: config.clone(),
            backend,
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Never fails; any error yields the single-speaker fallback.
    pub fn process(&self, audio_path: &Path, audio_duration: f64) -> DiarizationResult {
        let started = Instant::now();
        match self.try_process(audio_path, audio_duration) {
            Ok(result) => {
                let elapsed = started.elapsed().as_secs_f64();
                tracing::info!(
                    speakers = result.speakers().len(),
                    segments = result.segments().len(),
                    processing_time = elapsed,
                    "diarization_completed"
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    path = %audio_path.display(),
                    error = %e,
                    "diarization_fallback_single_speaker"
                );
                DiarizationResult::single_speaker(audio_duration, started.elapsed().as_secs_f64())
            }
        }
    }

    /// Strict variant of [`process`](Self::process) that reports why a
    /// result was rejected.
    pub fn try_process(&self, audio_path: &Path, audio_duration: f64) -> Result<DiarizationResult> {
        let started = Instant::now();
        if !audio_path.exists() {
            return Err(DiarizationError::ProcessingError(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }
        if !(audio_duration > 0.0) {
            return Err(DiarizationError::ProcessingError(format!(
                "invalid audio duration: {audio_duration}"
            )));
        }
        let backend = self.backend.as_ref().ok_or(DiarizationError::ModelNotLoaded)?;

        let hint = SpeakerCountHint {
            min: self.config.min_speakers,
            max: self.config.max_speakers,
        };
        let turns = backend.process(audio_path, hint)?;
        let segments = self.segments_from_turns(&turns, audio_duration)?;
        let speakers: Vec<u32> = segments
            .iter()
            .map(|s| s.speaker_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let result = DiarizationResult::with_tolerance(
            speakers,
            segments,
            audio_duration,
            started.elapsed().as_secs_f64(),
            self.config.overlap_tolerance,
        )?;
        self.check_quality(&result, audio_duration)?;
        Ok(result)
    }

    /// Clamp to the recording, drop empty turns, sort, then merge close
    /// turns of the same speaker.
    fn segments_from_turns(
        &self,
        turns: &[SpeakerTurn],
        audio_duration: f64,
    ) -> Result<Vec<SpeakerSegment>> {
        let ids = label_ids(turns.iter().map(|t| t.label.as_str()));

        let mut segments = Vec::with_capacity(turns.len());
        for turn in turns {
            let start = turn.start.max(0.0);
            let end = turn.end.min(audio_duration);
            if end <= start {
                continue;
            }
            let speaker_id = ids.get(turn.label.as_str()).copied().unwrap_or(0);
            let confidence = turn.confidence.unwrap_or(DEFAULT_TURN_CONFIDENCE);
            segments.push(SpeakerSegment::new(speaker_id, start, end, confidence)?);
        }
        segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        Ok(merge_close_segments(segments, self.config.merge_gap))
    }

    /// Coverage, confidence and segment-length checks.
    pub fn check_quality(&self, result: &DiarizationResult, expected_duration: f64) -> Result<()> {
        if result.speakers().is_empty() || result.segments().is_empty() {
            return Err(DiarizationError::LowQuality("no speakers detected".into()));
        }

        let coverage = result.coverage(expected_duration);
        if coverage < self.config.min_coverage {
            return Err(DiarizationError::LowQuality(format!(
                "coverage {:.0}% is below {:.0}%",
                coverage * 100.0,
                self.config.min_coverage * 100.0
            )));
        }

        if result.segments().iter().any(|s| s.confidence <= 0.0) {
            return Err(DiarizationError::LowQuality(
                "segment with non-positive confidence".into(),
            ));
        }

        let short = result
            .segments()
            .iter()
            .filter(|s| s.duration() < self.config.min_segment_duration)
            .count();
        let total = result.segments().len();
        if short as f64 > total as f64 * self.config.max_short_segment_ratio {
            return Err(DiarizationError::LowQuality(format!(
                "{short} of {total} segments are shorter than {}s",
                self.config.min_segment_duration
            )));
        }

        Ok(())
    }
}

/// Numeric id from a label such as `SPEAKER_01`.
pub fn speaker_label_to_id(label: &str) -> Option<u32> {
    label.rsplit('_').next()?.parse().ok()
}

/// Map every label to an id. Labels without a numeric suffix are numbered
/// in order of first appearance after the highest numeric id.
fn label_ids<'a>(labels: impl Iterator<Item = &'a str> + Clone) -> HashMap<&'a str, u32> {
    let mut ids = HashMap::new();
    let mut next = labels
        .clone()
        .filter_map(speaker_label_to_id)
        .max()
        .map_or(0, |max| max + 1);

    for label in labels {
        if ids.contains_key(label) {
            continue;
        }
        let id = match speaker_label_to_id(label) {
            Some(id) => id,
            None => {
                let id = next;
                next += 1;
                id
            }
        };
        ids.insert(label, id);
    }
    ids
}

/// Merge consecutive segments of the same speaker separated by at most `gap`.
pub fn merge_close_segments(segments: Vec<SpeakerSegment>, gap: f64) -> Vec<SpeakerSegment> {
    let mut merged: Vec<SpeakerSegment> = Vec::with_capacity(segments.len());
    for current in segments {
        if let Some(last) = merged.last_mut() {
            if current.speaker_id == last.speaker_id && current.start_time - last.end_time <= gap {
                last.end_time = last.end_time.max(current.end_time);
                last.confidence = last.confidence.max(current.confidence);
                continue;
            }
        }
        merged.push(current);
    }
    merged
}
