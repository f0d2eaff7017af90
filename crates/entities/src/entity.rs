use crate::error::{EntityValidationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Allowed difference between `duration` and `end_time - start_time`.
pub const DURATION_TOLERANCE_SECS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[default]
    Word,
    /// Reserved, not produced by the word pipeline.
    Phrase,
    /// Reserved, not produced by the word pipeline.
    Sentence,
}

/// Inputs for [`Entity::new`]. Derived fields (`duration`, `syllable_count`)
/// are computed, never supplied.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f64,
    pub probability: f64,
    pub syllables: Vec<String>,
    pub quality_score: f64,
    pub speaker_id: u32,
    pub recording_id: String,
    pub recording_path: String,
    pub created_at: DateTime<Utc>,
}

/// A single extracted word occurrence.
///
/// Timing and scoring are fixed at construction. After that only the
/// speaker assignment and the clip lifecycle fields can change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntityRecord")]
pub struct Entity {
    entity_id: String,
    entity_type: EntityType,
    text: String,
    start_time: f64,
    end_time: f64,
    duration: f64,
    confidence: f64,
    probability: f64,
    syllables: Vec<String>,
    syllable_count: usize,
    quality_score: f64,
    speaker_id: u32,
    recording_id: String,
    recording_path: String,
    processed: bool,
    clip_path: Option<String>,
    selection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

/// Wire shape; every parsed record goes through the same checks as `Entity::new`.
#[derive(Deserialize)]
struct EntityRecord {
    entity_id: String,
    entity_type: EntityType,
    text: String,
    start_time: f64,
    end_time: f64,
    duration: f64,
    confidence: f64,
    probability: f64,
    #[serde(default)]
    syllables: Vec<String>,
    #[serde(default)]
    syllable_count: usize,
    #[serde(default)]
    quality_score: f64,
    speaker_id: u32,
    recording_id: String,
    recording_path: String,
    #[serde(default)]
    processed: bool,
    #[serde(default)]
    clip_path: Option<String>,
    #[serde(default)]
    selection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntityRecord> for Entity {
    type Error = EntityValidationError;

    fn try_from(record: EntityRecord) -> Result<Self> {
        let entity = Entity {
            entity_id: record.entity_id,
            entity_type: record.entity_type,
            text: record.text,
            start_time: record.start_time,
            end_time: record.end_time,
            duration: record.duration,
            confidence: record.confidence,
            probability: record.probability,
            syllables: record.syllables,
            syllable_count: record.syllable_count,
            quality_score: record.quality_score,
            speaker_id: record.speaker_id,
            recording_id: record.recording_id,
            recording_path: record.recording_path,
            processed: record.processed,
            clip_path: record.clip_path,
            selection_reason: record.selection_reason,
            created_at: record.created_at,
        };
        entity.validate()?;
        Ok(entity)
    }
}

impl Entity {
    pub fn new(new: NewEntity) -> Result<Self> {
        let entity = Entity {
            duration: new.end_time - new.start_time,
            syllable_count: new.syllables.len(),
            entity_id: new.entity_id,
            entity_type: new.entity_type,
            text: new.text,
            start_time: new.start_time,
            end_time: new.end_time,
            confidence: new.confidence,
            probability: new.probability,
            syllables: new.syllables,
            quality_score: new.quality_score,
            speaker_id: new.speaker_id,
            recording_id: new.recording_id,
            recording_path: new.recording_path,
            processed: false,
            clip_path: None,
            selection_reason: None,
            created_at: new.created_at,
        };
        entity.validate()?;
        Ok(entity)
    }

    fn validate(&self) -> Result<()> {
        if self.entity_id.trim().is_empty() {
            return Err(EntityValidationError::EmptyId);
        }
        for (field, value) in [
            ("start_time", self.start_time),
            ("end_time", self.end_time),
            ("duration", self.duration),
            ("confidence", self.confidence),
            ("probability", self.probability),
            ("quality_score", self.quality_score),
        ] {
            if !value.is_finite() {
                return Err(EntityValidationError::NonFinite { field });
            }
        }
        if self.start_time < 0.0 {
            return Err(EntityValidationError::NegativeStart {
                start: self.start_time,
            });
        }
        if self.end_time <= self.start_time {
            return Err(EntityValidationError::EndNotAfterStart {
                start: self.start_time,
                end: self.end_time,
            });
        }
        let expected = self.end_time - self.start_time;
        if (self.duration - expected).abs() > DURATION_TOLERANCE_SECS {
            return Err(EntityValidationError::DurationMismatch {
                duration: self.duration,
                expected,
            });
        }
        for (field, value) in [
            ("confidence", self.confidence),
            ("probability", self.probability),
            ("quality_score", self.quality_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EntityValidationError::OutOfUnitRange { field, value });
            }
        }
        if self.syllable_count != self.syllables.len() {
            return Err(EntityValidationError::SyllableCountMismatch {
                count: self.syllable_count,
                actual: self.syllables.len(),
            });
        }
        Ok(())
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Center of the word's interval, used for speaker lookups.
    pub fn midpoint(&self) -> f64 {
        (self.start_time + self.end_time) / 2.0
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn syllables(&self) -> &[String] {
        &self.syllables
    }

    pub fn syllable_count(&self) -> usize {
        self.syllable_count
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn speaker_id(&self) -> u32 {
        self.speaker_id
    }

    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    pub fn recording_path(&self) -> &str {
        &self.recording_path
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn clip_path(&self) -> Option<&str> {
        self.clip_path.as_deref()
    }

    pub fn selection_reason(&self) -> Option<&str> {
        self.selection_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Speaker attribution is the only field the mapping step may rewrite.
    pub fn set_speaker_id(&mut self, speaker_id: u32) {
        self.speaker_id = speaker_id;
    }

    /// Record that an audio clip has been written for this entity.
    pub fn mark_extracted(&mut self, clip_path: impl Into<String>, reason: Option<String>) {
        self.processed = true;
        self.clip_path = Some(clip_path.into());
        if reason.is_some() {
            self.selection_reason = reason;
        }
    }
}
