//! Replays a transcription produced elsewhere.
//!
//! Lets a recording be re-processed offline from a saved word list
//! (e.g. a faster-whisper dump) without loading any model.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::{SttEngine, WordHypothesis};
use crate::{Result, SttError};

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Words(Vec<WordHypothesis>),
    Wrapped { words: Vec<WordHypothesis> },
}

pub struct ReplayEngine {
    words: Vec<WordHypothesis>,
    source: Option<PathBuf>,
}

impl ReplayEngine {
    pub fn new(words: Vec<WordHypothesis>) -> Self {
        Self {
            words,
            source: None,
        }
    }

    /// Load a JSON array of words, or an object with a `words` array.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| SttError::InvalidTranscript {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let parsed: TranscriptFile =
            serde_json::from_str(&contents).map_err(|e| SttError::InvalidTranscript {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let words = match parsed {
            TranscriptFile::Words(words) | TranscriptFile::Wrapped { words } => words,
        };

        tracing::info!(path = %path.display(), words = words.len(), "transcript_loaded");
        Ok(Self {
            words,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl SttEngine for ReplayEngine {
    fn transcribe(&self, _audio: &[f32]) -> Result<Vec<WordHypothesis>> {
        Ok(self.words.clone())
    }

    /// No decoding needed; the words are already known.
    fn transcribe_file(&self, _path: &Path) -> Result<Vec<WordHypothesis>> {
        Ok(self.words.clone())
    }

    fn model_name(&self) -> &str {
        "replay"
    }
}
