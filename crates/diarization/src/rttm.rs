//! Reads speaker turns from an RTTM file.
//!
//! RTTM is the exchange format written by most diarization toolkits
//! (`SPEAKER <file> <chan> <start> <dur> <NA> <NA> <label> <conf> <NA>`), so a
//! diarization computed offline can be attached to a recording.

use std::path::{Path, PathBuf};

use crate::processor::{Diarizer, SpeakerCountHint, SpeakerTurn};
use crate::{DiarizationError, Result};

pub struct RttmDiarizer {
    path: PathBuf,
}

impl RttmDiarizer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<audio>.rttm` next to the recording, if it exists.
    pub fn sibling_of(audio_path: &Path) -> Option<Self> {
        let candidate = audio_path.with_extension("rttm");
        candidate.exists().then(|| Self::new(candidate))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Diarizer for RttmDiarizer {
    fn name(&self) -> &str {
        "rttm"
    }

    fn process(&self, _audio_path: &Path, _hint: SpeakerCountHint) -> Result<Vec<SpeakerTurn>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            DiarizationError::ProcessingError(format!("{}: {e}", self.path.display()))
        })?;
        parse_rttm(&contents)
    }
}

pub fn parse_rttm(contents: &str) -> Result<Vec<SpeakerTurn>> {
    let mut turns = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first() != Some(&"SPEAKER") {
            continue;
        }
        if fields.len() < 8 {
            return Err(DiarizationError::ProcessingError(format!(
                "rttm line {} has {} fields, expected at least 8",
                line_no + 1,
                fields.len()
            )));
        }
        let number = |idx: usize| -> Result<f64> {
            fields[idx].parse::<f64>().map_err(|_| {
                DiarizationError::ProcessingError(format!(
                    "rttm line {}: '{}' is not a number",
                    line_no + 1,
                    fields[idx]
                ))
            })
        };
        let start = number(3)?;
        let duration = number(4)?;
        let confidence = fields.get(8).and_then(|c| c.parse::<f64>().ok());

        turns.push(SpeakerTurn {
            label: fields[7].to_string(),
            start,
            end: start + duration,
            confidence,
        });
    }
    Ok(turns)
}
