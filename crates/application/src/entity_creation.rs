use chrono::{DateTime, Utc};
use palabra_entities::{Entity, EntityType, EntityValidationError, NewEntity};
use palabra_stt::WordHypothesis;

use crate::constants::ENTITY_ID_PREFIX;
use crate::error::EntityError;
use crate::scoring::QualityScorer;
use crate::speakers::SpeakerResolver;
use crate::syllables::SyllableEstimator;

/// Why a single hypothesis was not turned into an entity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("end_time {end} is not after start_time {start}")]
    NonPositiveDuration { start: f64, end: f64 },
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("text is empty after cleaning")]
    EmptyText,
    #[error("{0}")]
    Invalid(#[from] EntityValidationError),
}

/// A hypothesis that was dropped, with its stream position.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedHypothesis {
    pub index: usize,
    pub text: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct CreationBatch {
    pub entities: Vec<Entity>,
    pub skipped: Vec<SkippedHypothesis>,
}

/// Strip surrounding punctuation and whitespace, e.g. `"¿Qué?"` -> `"Qué"`.
pub fn clean_text(text: &str) -> &str {
    text.trim_matches(|c: char| !c.is_alphanumeric())
}

/// `word_001` for index 0.
pub fn entity_id_for(index: usize) -> String {
    format!("{ENTITY_ID_PREFIX}{:03}", index + 1)
}

/// Turns word hypotheses into validated entities for one recording.
pub struct EntityCreator<'a> {
    recording_id: String,
    recording_path: String,
    resolver: &'a SpeakerResolver,
    created_at: DateTime<Utc>,
}

impl<'a> EntityCreator<'a> {
    pub fn new(
        recording_id: impl Into<String>,
        recording_path: impl Into<String>,
        resolver: &'a SpeakerResolver,
    ) -> Self {
        Self {
            recording_id: recording_id.into(),
            recording_path: recording_path.into(),
            resolver,
            created_at: Utc::now(),
        }
    }

    /// Build the entity for the hypothesis at stream position `index`.
    pub fn create(&self, index: usize, hypothesis: &WordHypothesis) -> Result<Entity, SkipReason> {
        let (start, end) = (hypothesis.start_time, hypothesis.end_time);
        if !(end > start) {
            return Err(SkipReason::NonPositiveDuration { start, end });
        }
        if !(0.0..=1.0).contains(&hypothesis.confidence) {
            return Err(SkipReason::ConfidenceOutOfRange(hypothesis.confidence));
        }
        let text = clean_text(&hypothesis.text);
        if text.is_empty() {
            return Err(SkipReason::EmptyText);
        }

        let syllables = SyllableEstimator::estimate(text);
        let quality_score =
            QualityScorer::score(hypothesis.confidence, end - start, syllables.len());

        let entity = Entity::new(NewEntity {
            entity_id: entity_id_for(index),
            entity_type: EntityType::Word,
            text: text.to_string(),
            start_time: start,
            end_time: end,
            confidence: hypothesis.confidence,
            probability: hypothesis.confidence,
            syllables,
            quality_score,
            speaker_id: self.resolver.resolve(start, end),
            recording_id: self.recording_id.clone(),
            recording_path: self.recording_path.clone(),
            created_at: self.created_at,
        })?;
        Ok(entity)
    }

    /// Create entities for every hypothesis, skipping the invalid ones.
    ///
    /// Ids follow stream position, so skipped hypotheses leave gaps.
    /// Fails only when a non-empty batch yields no entity at all.
    pub fn create_all(&self, hypotheses: &[WordHypothesis]) -> Result<CreationBatch, EntityError> {
        tracing::info!(
            word_count = hypotheses.len(),
            recording_id = %self.recording_id,
            "entity_creation_started"
        );

        let mut batch = CreationBatch::default();
        for (index, hypothesis) in hypotheses.iter().enumerate() {
            match self.create(index, hypothesis) {
                Ok(entity) => batch.entities.push(entity),
                Err(reason) => {
                    tracing::warn!(
                        word_index = index,
                        word_text = %hypothesis.text,
                        reason = %reason,
                        "hypothesis_skipped"
                    );
                    batch.skipped.push(SkippedHypothesis {
                        index,
                        text: hypothesis.text.clone(),
                        reason,
                    });
                }
            }
        }

        if !hypotheses.is_empty() && batch.entities.is_empty() {
            return Err(EntityError::AllRejected {
                rejected: batch.skipped.len(),
            });
        }

        tracing::info!(
            entities_created = batch.entities.len(),
            skipped = batch.skipped.len(),
            "entity_creation_completed"
        );
        Ok(batch)
    }
}
