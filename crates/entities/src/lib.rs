mod database;
mod entity;
mod error;
mod speaker;

pub use database::{base_metadata, WordDatabase, DATABASE_VERSION};
pub use entity::{Entity, EntityType, NewEntity, DURATION_TOLERANCE_SECS};
pub use error::{EntityValidationError, Result};
pub use speaker::{Gender, SpeakerInfo};
