use palabra_config::QualityConfig;
use palabra_entities::Entity;

use crate::constants::SYLLABLE_EXCEPTIONS;

/// Threshold gate over created entities.
///
/// Independent of entity creation, so a persisted database can be
/// re-filtered with different thresholds.
pub struct QualityFilter<'a> {
    config: &'a QualityConfig,
}

impl<'a> QualityFilter<'a> {
    pub fn new(config: &'a QualityConfig) -> Self {
        Self { config }
    }

    pub fn passes(&self, entity: &Entity) -> bool {
        self.confidence_ok(entity)
            && self.duration_ok(entity)
            && self.syllables_ok(entity)
            && !entity.text().trim().is_empty()
    }

    fn confidence_ok(&self, entity: &Entity) -> bool {
        entity.confidence() >= self.config.min_confidence
    }

    fn duration_ok(&self, entity: &Entity) -> bool {
        (self.config.min_word_duration..=self.config.max_word_duration)
            .contains(&entity.duration())
    }

    /// Exception words waive the syllable range, nothing else.
    fn syllables_ok(&self, entity: &Entity) -> bool {
        let [min, max] = self.config.syllable_range;
        (min..=max).contains(&entity.syllable_count())
            || SYLLABLE_EXCEPTIONS.contains(&entity.text().to_lowercase().as_str())
    }

    /// Keep the entities that pass, in their original order.
    pub fn apply(&self, entities: Vec<Entity>) -> Vec<Entity> {
        let original = entities.len();
        let kept: Vec<Entity> = entities.into_iter().filter(|e| self.passes(e)).collect();

        let pass_rate = if original > 0 {
            kept.len() as f64 / original as f64 * 100.0
        } else {
            0.0
        };
        let pass_rate = format!("{pass_rate:.1}%");
        tracing::info!(
            original_count = original,
            filtered_count = kept.len(),
            pass_rate = %pass_rate,
            "quality_filtering_completed"
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_creation::EntityCreator;
    use crate::speakers::SpeakerResolver;
    use palabra_stt::WordHypothesis;

    fn entities(words: &[(&str, f64, f64, f64)]) -> Vec<Entity> {
        let resolver = SpeakerResolver::new(None, None, &Default::default());
        let creator = EntityCreator::new("rec_test", "test.wav", &resolver);
        let hypotheses: Vec<_> = words
            .iter()
            .map(|&(text, start, end, confidence)| WordHypothesis::new(text, start, end, confidence))
            .collect();
        creator.create_all(&hypotheses).unwrap().entities
    }

    fn texts(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(Entity::text).collect()
    }

    #[test]
    fn test_default_thresholds_scenario() {
        let config = QualityConfig::default();
        let filter = QualityFilter::new(&config);
        let input = entities(&[
            ("hola", 1.0, 1.5, 0.95),
            ("que", 1.6, 1.8, 0.4),
            ("como", 1.9, 2.3, 0.9),
            ("a", 2.4, 2.42, 0.8),
            ("extraordinariamente", 3.0, 7.0, 0.8),
        ]);
        let kept = filter.apply(input);
        assert_eq!(texts(&kept), vec!["hola", "como"]);
    }

    #[test]
    fn test_syllable_exceptions() {
        let config = QualityConfig::default();
        let filter = QualityFilter::new(&config);
        let input = entities(&[
            ("tal", 0.0, 0.5, 0.9),
            ("x", 1.0, 1.5, 0.9),
            ("Con", 2.0, 2.5, 0.9),
            ("sol", 3.0, 3.5, 0.9),
        ]);
        let kept = filter.apply(input);
        assert_eq!(texts(&kept), vec!["tal", "Con"]);
    }

    #[test]
    fn test_exception_does_not_waive_other_thresholds() {
        let config = QualityConfig::default();
        let filter = QualityFilter::new(&config);
        let input = entities(&[("que", 0.0, 0.5, 0.5), ("por", 1.0, 1.1, 0.95)]);
        assert!(filter.apply(input).is_empty());
    }

    #[test]
    fn test_duration_bounds_inclusive() {
        let config = QualityConfig {
            min_word_duration: 0.5,
            max_word_duration: 1.0,
            ..QualityConfig::default()
        };
        let filter = QualityFilter::new(&config);
        let input = entities(&[
            ("casa", 0.0, 0.5, 0.9),
            ("perro", 1.0, 2.0, 0.9),
            ("gato", 3.0, 4.5, 0.9),
        ]);
        assert_eq!(texts(&filter.apply(input)), vec!["casa", "perro"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let config = QualityConfig::default();
        let filter = QualityFilter::new(&config);
        let input = entities(&[
            ("hola", 1.0, 1.5, 0.95),
            ("que", 1.6, 1.8, 0.4),
            ("tal", 1.9, 2.3, 0.9),
            ("gracias", 2.4, 3.0, 0.85),
        ]);
        let once = filter.apply(input);
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
    }
}
