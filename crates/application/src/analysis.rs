use std::collections::BTreeMap;

use palabra_entities::{SpeakerInfo, WordDatabase};
use serde::Serialize;

/// Per-speaker aggregates over a word database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerSummary {
    pub speaker_id: u32,
    pub name: String,
    pub entity_count: usize,
    pub mean_confidence: f64,
    pub mean_quality: f64,
    /// Sum of word durations, in seconds.
    pub speech_time: f64,
}

/// One summary per speaker with entities or a speaker map entry, by id.
pub fn summarize_speakers(database: &WordDatabase) -> Vec<SpeakerSummary> {
    let mut totals: BTreeMap<u32, (usize, f64, f64, f64)> = database
        .speaker_map()
        .keys()
        .map(|&id| (id, (0, 0.0, 0.0, 0.0)))
        .collect();
    for entity in database.entities() {
        let entry = totals.entry(entity.speaker_id()).or_default();
        entry.0 += 1;
        entry.1 += entity.confidence();
        entry.2 += entity.quality_score();
        entry.3 += entity.duration();
    }

    totals
        .into_iter()
        .map(|(speaker_id, (count, confidence, quality, speech_time))| {
            let mean = |sum: f64| if count > 0 { sum / count as f64 } else { 0.0 };
            SpeakerSummary {
                speaker_id,
                name: database
                    .speaker_map()
                    .get(&speaker_id)
                    .map(|info| info.name.clone())
                    .unwrap_or_else(|| SpeakerInfo::numbered(speaker_id).name),
                entity_count: count,
                mean_confidence: mean(confidence),
                mean_quality: mean(quality),
                speech_time,
            }
        })
        .collect()
}

/// Replace speaker map entries. Entities are not touched.
pub fn relabel_speakers(
    database: &mut WordDatabase,
    labels: impl IntoIterator<Item = (u32, SpeakerInfo)>,
) -> usize {
    let mut changed = 0;
    for (speaker_id, info) in labels {
        tracing::info!(speaker_id, name = %info.name, "speaker_relabeled");
        database.set_speaker(speaker_id, info);
        changed += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use palabra_entities::{base_metadata, Entity, EntityType, Gender, NewEntity};

    fn entity(id: &str, speaker_id: u32, start: f64, end: f64, confidence: f64) -> Entity {
        Entity::new(NewEntity {
            entity_id: id.to_string(),
            entity_type: EntityType::Word,
            text: "palabra".to_string(),
            start_time: start,
            end_time: end,
            confidence,
            probability: confidence,
            syllables: vec!["pa".into(), "la".into(), "bra".into()],
            quality_score: 0.5,
            speaker_id,
            recording_id: "rec_test".to_string(),
            recording_path: "test.wav".to_string(),
            created_at: Utc::now(),
        })
        .unwrap()
    }

    fn database() -> WordDatabase {
        let mut speakers = BTreeMap::new();
        speakers.insert(0, SpeakerInfo::default_speaker());
        speakers.insert(1, SpeakerInfo::new("Lucía"));
        speakers.insert(4, SpeakerInfo::new("Silencioso"));
        WordDatabase::new(
            base_metadata(Utc::now()),
            speakers,
            vec![
                entity("word_001", 1, 0.0, 0.5, 0.8),
                entity("word_002", 1, 1.0, 2.0, 1.0),
                entity("word_003", 0, 3.0, 3.5, 0.9),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_summarize_speakers() {
        let summaries = summarize_speakers(&database());
        assert_eq!(summaries.len(), 3);

        let lucia = &summaries[1];
        assert_eq!(lucia.speaker_id, 1);
        assert_eq!(lucia.name, "Lucía");
        assert_eq!(lucia.entity_count, 2);
        assert!((lucia.mean_confidence - 0.9).abs() < 1e-9);
        assert!((lucia.speech_time - 1.5).abs() < 1e-9);

        let silent = &summaries[2];
        assert_eq!(silent.entity_count, 0);
        assert_eq!(silent.mean_confidence, 0.0);
    }

    #[test]
    fn test_relabel_speakers() {
        let mut db = database();
        let info = SpeakerInfo {
            name: "Andrés".to_string(),
            gender: Gender::M,
            region: "Cali".to_string(),
        };
        assert_eq!(relabel_speakers(&mut db, [(0, info.clone())]), 1);
        assert_eq!(db.speaker_map()[&0], info);
        assert_eq!(db.entities()[2].speaker_id(), 0);
    }
}
