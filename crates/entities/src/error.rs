/// Invariant violations detected while building or parsing entities and databases.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntityValidationError {
    #[error("entity_id must not be empty")]
    EmptyId,
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("start_time must be >= 0 (got {start})")]
    NegativeStart { start: f64 },
    #[error("end_time must be greater than start_time ({end} <= {start})")]
    EndNotAfterStart { start: f64, end: f64 },
    #[error("duration ({duration}) must match end_time - start_time ({expected})")]
    DurationMismatch { duration: f64, expected: f64 },
    #[error("{field} must be within [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("syllable_count ({count}) must match length of syllables ({actual})")]
    SyllableCountMismatch { count: usize, actual: usize },
    #[error("metadata must contain {0}")]
    MissingMetadata(&'static str),
    #[error("duplicate entity_id {0}")]
    DuplicateEntityId(String),
    #[error("entity {entity_id} belongs to {found}, expected {expected}")]
    MixedRecordings {
        entity_id: String,
        expected: String,
        found: String,
    },
}

pub type Result<T> = std::result::Result<T, EntityValidationError>;
