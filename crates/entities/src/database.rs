use crate::entity::{Entity, EntityType};
use crate::error::{EntityValidationError, Result};
use crate::speaker::SpeakerInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Schema version written into `metadata.version`.
pub const DATABASE_VERSION: &str = "1.0";

/// Per-recording aggregate: metadata, speaker labels and the entity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatabaseRecord")]
pub struct WordDatabase {
    metadata: Map<String, Value>,
    speaker_map: BTreeMap<u32, SpeakerInfo>,
    entities: Vec<Entity>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseRecord {
    metadata: Map<String, Value>,
    speaker_map: BTreeMap<u32, SpeakerInfo>,
    entities: Vec<Entity>,
}

impl TryFrom<DatabaseRecord> for WordDatabase {
    type Error = EntityValidationError;

    fn try_from(record: DatabaseRecord) -> Result<Self> {
        WordDatabase::new(record.metadata, record.speaker_map, record.entities)
    }
}

/// Metadata map holding the two required keys.
pub fn base_metadata(created_at: DateTime<Utc>) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("version".into(), Value::from(DATABASE_VERSION));
    metadata.insert("created_at".into(), Value::from(created_at.to_rfc3339()));
    metadata
}

impl WordDatabase {
    pub fn new(
        metadata: Map<String, Value>,
        speaker_map: BTreeMap<u32, SpeakerInfo>,
        entities: Vec<Entity>,
    ) -> Result<Self> {
        for key in ["version", "created_at"] {
            if !metadata.contains_key(key) {
                return Err(EntityValidationError::MissingMetadata(key));
            }
        }
        let mut seen = HashSet::with_capacity(entities.len());
        let recording_id = entities.first().map(Entity::recording_id);
        for entity in &entities {
            if !seen.insert(entity.entity_id()) {
                return Err(EntityValidationError::DuplicateEntityId(
                    entity.entity_id().to_string(),
                ));
            }
            if let Some(expected) = recording_id.filter(|&id| id != entity.recording_id()) {
                return Err(EntityValidationError::MixedRecordings {
                    entity_id: entity.entity_id().to_string(),
                    expected: expected.to_string(),
                    found: entity.recording_id().to_string(),
                });
            }
        }
        Ok(Self {
            metadata,
            speaker_map,
            entities,
        })
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.get("version").and_then(Value::as_str)
    }

    pub fn speaker_map(&self) -> &BTreeMap<u32, SpeakerInfo> {
        &self.speaker_map
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }

    /// Add or replace a metadata entry. The required keys can be
    /// overwritten but never removed.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn set_speaker(&mut self, speaker_id: u32, info: SpeakerInfo) {
        self.speaker_map.insert(speaker_id, info);
    }

    pub fn entities_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.entity_type() == entity_type)
            .collect()
    }

    pub fn entities_by_speaker(&self, speaker_id: u32) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.speaker_id() == speaker_id)
            .collect()
    }

    pub fn entities_by_confidence(&self, min_confidence: f64) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.confidence() >= min_confidence)
            .collect()
    }
}
