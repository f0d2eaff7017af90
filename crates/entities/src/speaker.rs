use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gender {
    M,
    F,
    #[default]
    Unknown,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            "Unknown" => Ok(Gender::Unknown),
            other => Err(format!("gender must be one of M, F, Unknown (got {other})")),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::Unknown => "Unknown",
        })
    }
}

/// Descriptive speaker metadata. Never affects pipeline decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerInfo {
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default = "unknown_region")]
    pub region: String,
}

fn unknown_region() -> String {
    "Unknown".to_string()
}

impl SpeakerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: Gender::Unknown,
            region: unknown_region(),
        }
    }

    /// Entry used for speaker 0 when nothing more specific is known.
    pub fn default_speaker() -> Self {
        Self::new("Default Speaker")
    }

    /// Generic label for a numbered speaker, e.g. "Speaker 2".
    pub fn numbered(speaker_id: u32) -> Self {
        Self::new(format!("Speaker {speaker_id}"))
    }
}
