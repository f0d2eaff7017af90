use crate::constants::{
    CONFIDENCE_WEIGHT, DURATION_WEIGHT, PREFERRED_MAX_DURATION, PREFERRED_MAX_SYLLABLES,
    PREFERRED_MIN_DURATION, SYLLABLE_WEIGHT,
};

/// Advisory quality score stored on each entity. Filtering never reads it.
pub struct QualityScorer;

impl QualityScorer {
    pub fn score(confidence: f64, duration: f64, syllable_count: usize) -> f64 {
        let blended = confidence * CONFIDENCE_WEIGHT
            + Self::duration_score(duration) * DURATION_WEIGHT
            + Self::syllable_score(syllable_count) * SYLLABLE_WEIGHT;
        blended.clamp(0.0, 1.0)
    }

    fn duration_score(duration: f64) -> f64 {
        if duration < PREFERRED_MIN_DURATION {
            0.5
        } else if duration > PREFERRED_MAX_DURATION {
            0.7
        } else {
            1.0
        }
    }

    /// Zero syllables never reaches here from the pipeline; it scores 1.0.
    fn syllable_score(syllable_count: usize) -> f64 {
        match syllable_count {
            1 => 0.6,
            n if n > PREFERRED_MAX_SYLLABLES => 0.8,
            _ => 1.0,
        }
    }
}
