//! Speaker attribution for word entities.
//!
//! A word is attributed by its midpoint. Sources are tried in a fixed
//! priority: diarization output, then a list mapping, then a range mapping,
//! then the default speaker 0.

use std::collections::BTreeMap;
use std::path::Path;

use palabra_config::SpeakersConfig;
use palabra_diarization::{DiarizationResult, SpeakerSegment};
use palabra_entities::{Entity, Gender, SpeakerInfo};
use serde::Deserialize;
use serde_json::Value;

use crate::constants::UNKNOWN_SPEAKER_NAME;
use crate::error::SpeakerError;

/// Closed interval `[start, end]` attributed to one speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerInterval {
    pub start: f64,
    pub end: f64,
    pub speaker_id: u32,
}

impl SpeakerInterval {
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

/// A user-supplied speaker mapping, in one of its two file shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeakerMapping {
    /// `[{"start": 0.0, "end": 5.0, "speaker_id": 1, "speaker": "Ana"}, ...]`
    Intervals {
        intervals: Vec<SpeakerInterval>,
        names: BTreeMap<u32, SpeakerInfo>,
    },
    /// `{"0.0-5.0": "speaker_1", ...}`
    Ranges(Vec<SpeakerInterval>),
}

#[derive(Debug, Deserialize)]
struct IntervalEntry {
    #[serde(default)]
    start: f64,
    #[serde(default = "unbounded_end")]
    end: f64,
    #[serde(default)]
    speaker_id: u32,
    #[serde(default, alias = "name")]
    speaker: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

fn unbounded_end() -> f64 {
    f64::INFINITY
}

impl SpeakerMapping {
    pub fn load(path: &Path) -> Result<Self, SpeakerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SpeakerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| SpeakerError::InvalidMapping(format!("{}: {e}", path.display())))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self, SpeakerError> {
        match value {
            Value::Array(_) => Self::from_entries(value),
            Value::Object(ranges) => {
                let intervals = ranges
                    .iter()
                    .filter_map(|(key, speaker)| parse_range_entry(key, speaker))
                    .collect();
                Ok(SpeakerMapping::Ranges(intervals))
            }
            other => Err(SpeakerError::InvalidMapping(format!(
                "expected a list of intervals or a \"start-end\" object, got {}",
                json_kind(other)
            ))),
        }
    }

    fn from_entries(value: &Value) -> Result<Self, SpeakerError> {
        let entries: Vec<IntervalEntry> = serde_json::from_value(value.clone())
            .map_err(|e| SpeakerError::InvalidMapping(e.to_string()))?;

        let mut intervals = Vec::with_capacity(entries.len());
        let mut names = BTreeMap::new();
        for entry in entries {
            let gender = match entry.gender.as_deref() {
                None => Gender::Unknown,
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    tracing::warn!(speaker_id = entry.speaker_id, gender = raw, "unknown_gender");
                    Gender::Unknown
                }),
            };
            names.entry(entry.speaker_id).or_insert_with(|| SpeakerInfo {
                name: entry
                    .speaker
                    .unwrap_or_else(|| UNKNOWN_SPEAKER_NAME.to_string()),
                gender,
                region: entry.region.unwrap_or_else(|| "Unknown".to_string()),
            });
            intervals.push(SpeakerInterval {
                start: entry.start,
                end: entry.end,
                speaker_id: entry.speaker_id,
            });
        }
        Ok(SpeakerMapping::Intervals { intervals, names })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse one `"start-end": speaker` pair. Malformed pairs are skipped.
fn parse_range_entry(key: &str, speaker: &Value) -> Option<SpeakerInterval> {
    let bounds: Vec<&str> = key.split('-').collect();
    let parsed = match bounds.as_slice() {
        [start, end] => start
            .trim()
            .parse::<f64>()
            .ok()
            .zip(end.trim().parse::<f64>().ok()),
        _ => None,
    };
    let Some((start, end)) = parsed else {
        tracing::warn!(time_range = key, "invalid_time_range");
        return None;
    };

    let speaker_id = match speaker {
        Value::String(s) => s.strip_prefix("speaker_").unwrap_or(s).parse::<u32>().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    };
    let Some(speaker_id) = speaker_id else {
        tracing::warn!(time_range = key, speaker = %speaker, "invalid_speaker_id");
        return None;
    };

    Some(SpeakerInterval {
        start,
        end,
        speaker_id,
    })
}

/// Parse a `ID=NAME[:GENDER[:REGION]]` label, e.g. `1=Lucía:F:Bogotá`.
pub fn parse_speaker_label(label: &str) -> Result<(u32, SpeakerInfo), SpeakerError> {
    let invalid = || SpeakerError::InvalidLabel(label.to_string());
    let (id, rest) = label.split_once('=').ok_or_else(invalid)?;
    let speaker_id = id.trim().parse::<u32>().map_err(|_| invalid())?;

    let mut parts = rest.splitn(3, ':');
    let name = parts.next().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(invalid());
    }
    let mut info = SpeakerInfo::new(name);
    if let Some(gender) = parts.next().filter(|g| !g.trim().is_empty()) {
        info.gender = gender.trim().parse().map_err(|_| invalid())?;
    }
    if let Some(region) = parts.next().filter(|r| !r.trim().is_empty()) {
        info.region = region.trim().to_string();
    }
    Ok((speaker_id, info))
}

/// Where speaker ids come from for one recording.
#[derive(Debug, Clone)]
pub enum SpeakerSource {
    Diarization(DiarizationResult),
    Intervals(Vec<SpeakerInterval>),
    Ranges(Vec<SpeakerInterval>),
    Default,
}

impl SpeakerSource {
    pub fn name(&self) -> &'static str {
        match self {
            SpeakerSource::Diarization(_) => "diarization",
            SpeakerSource::Intervals(_) => "interval_mapping",
            SpeakerSource::Ranges(_) => "range_mapping",
            SpeakerSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeakerResolver {
    source: SpeakerSource,
    names: BTreeMap<u32, SpeakerInfo>,
    default_speaker: SpeakerInfo,
}

impl SpeakerResolver {
    /// Diarization output wins over any mapping when both are given.
    pub fn new(
        diarization: Option<DiarizationResult>,
        mapping: Option<SpeakerMapping>,
        config: &SpeakersConfig,
    ) -> Self {
        let default_speaker = match &config.default_speaker {
            Some(speaker) => SpeakerInfo {
                name: speaker.name.clone(),
                gender: speaker.gender.parse().unwrap_or_default(),
                region: speaker.region.clone(),
            },
            None => SpeakerInfo::default_speaker(),
        };

        let (source, names) = match (diarization, mapping) {
            (Some(result), _) => (SpeakerSource::Diarization(result), BTreeMap::new()),
            (None, Some(SpeakerMapping::Intervals { intervals, names })) => {
                (SpeakerSource::Intervals(intervals), names)
            }
            (None, Some(SpeakerMapping::Ranges(intervals))) => {
                (SpeakerSource::Ranges(intervals), BTreeMap::new())
            }
            (None, None) => (SpeakerSource::Default, BTreeMap::new()),
        };

        Self {
            source,
            names,
            default_speaker,
        }
    }

    pub fn source(&self) -> &SpeakerSource {
        &self.source
    }

    /// Speaker id for a word spanning `[start, end]`.
    pub fn resolve(&self, start: f64, end: f64) -> u32 {
        let midpoint = (start + end) / 2.0;
        match &self.source {
            SpeakerSource::Diarization(result) => nearest_segment(result.segments(), midpoint)
                .map(|segment| segment.speaker_id)
                .unwrap_or(0),
            SpeakerSource::Intervals(intervals) | SpeakerSource::Ranges(intervals) => intervals
                .iter()
                .find(|interval| interval.contains(midpoint))
                .map(|interval| interval.speaker_id)
                .unwrap_or(0),
            SpeakerSource::Default => 0,
        }
    }

    /// Speaker map for the ids actually used by `entities`.
    ///
    /// Names from a list mapping win; id 0 falls back to the configured
    /// default speaker and other ids to "Speaker N".
    pub fn speaker_map(&self, entities: &[Entity]) -> BTreeMap<u32, SpeakerInfo> {
        let mut map = BTreeMap::new();
        for entity in entities {
            let id = entity.speaker_id();
            map.entry(id).or_insert_with(|| self.info_for(id));
        }
        if map.is_empty() {
            map.insert(0, self.default_speaker.clone());
        }
        map
    }

    fn info_for(&self, speaker_id: u32) -> SpeakerInfo {
        if let Some(info) = self.names.get(&speaker_id) {
            return info.clone();
        }
        if speaker_id == 0 {
            self.default_speaker.clone()
        } else {
            SpeakerInfo::numbered(speaker_id)
        }
    }
}

/// The segment containing `time`, else the one with the closest edge.
/// Ties go to the earlier segment in stored order.
fn nearest_segment(segments: &[SpeakerSegment], time: f64) -> Option<&SpeakerSegment> {
    if let Some(segment) = segments.iter().find(|s| s.contains(time)) {
        return Some(segment);
    }
    segments.iter().reduce(|best, candidate| {
        if candidate.edge_distance(time) < best.edge_distance(time) {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use palabra_config::DefaultSpeakerConfig;
    use serde_json::json;

    fn segment(speaker_id: u32, start: f64, end: f64) -> SpeakerSegment {
        SpeakerSegment::new(speaker_id, start, end, 0.9).unwrap()
    }

    fn diarized(segments: Vec<SpeakerSegment>) -> DiarizationResult {
        let mut speakers: Vec<u32> = segments.iter().map(|s| s.speaker_id).collect();
        speakers.sort_unstable();
        speakers.dedup();
        DiarizationResult::new(speakers, segments, 20.0, 0.1).unwrap()
    }

    fn interval_mapping() -> SpeakerMapping {
        SpeakerMapping::from_json(&json!([
            {"start": 0.0, "end": 5.0, "speaker_id": 1},
            {"start": 5.0, "end": 15.0, "speaker_id": 2, "speaker": "Carlos", "gender": "M"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_interval_mapping_by_midpoint() {
        let resolver = SpeakerResolver::new(None, Some(interval_mapping()), &Default::default());
        assert_eq!(resolver.resolve(0.5, 1.0), 1);
        assert_eq!(resolver.resolve(2.5, 3.0), 1);
        assert_eq!(resolver.resolve(7.0, 8.0), 2);
        assert_eq!(resolver.resolve(20.0, 21.0), 0);
    }

    #[test]
    fn test_interval_bounds_are_inclusive_and_first_wins() {
        let resolver = SpeakerResolver::new(None, Some(interval_mapping()), &Default::default());
        // Midpoint 5.0 sits on both intervals.
        assert_eq!(resolver.resolve(4.5, 5.5), 1);
        assert_eq!(resolver.resolve(14.5, 15.5), 2);
    }

    #[test]
    fn test_interval_entry_defaults() {
        let mapping = SpeakerMapping::from_json(&json!([{"speaker_id": 3}])).unwrap();
        let resolver = SpeakerResolver::new(None, Some(mapping), &Default::default());
        assert_eq!(resolver.resolve(1000.0, 1001.0), 3);

        let SpeakerSource::Intervals(intervals) = resolver.source() else {
            panic!("expected interval source");
        };
        assert_eq!(intervals[0].start, 0.0);
        assert!(intervals[0].end.is_infinite());
    }

    #[test]
    fn test_range_mapping_value_forms() {
        let mapping = SpeakerMapping::from_json(&json!({
            "0.0-2.0": "speaker_1",
            "2.0-4.0": "2",
            "4.0-6.0": 3
        }))
        .unwrap();
        let resolver = SpeakerResolver::new(None, Some(mapping), &Default::default());
        assert_eq!(resolver.resolve(0.5, 1.0), 1);
        assert_eq!(resolver.resolve(2.5, 3.0), 2);
        assert_eq!(resolver.resolve(4.5, 5.0), 3);
        assert_eq!(resolver.resolve(7.0, 8.0), 0);
    }

    #[test]
    fn test_range_mapping_follows_file_order() {
        let value: Value = serde_json::from_str(
            r#"{"5.0-10.0": "speaker_1", "0.0-6.0": "speaker_2", "10.0-12.0": "speaker_3"}"#,
        )
        .unwrap();
        let mapping = SpeakerMapping::from_json(&value).unwrap();
        let resolver = SpeakerResolver::new(None, Some(mapping), &Default::default());
        assert_eq!(resolver.resolve(5.0, 6.0), 1);
        assert_eq!(resolver.resolve(1.0, 2.0), 2);
        assert_eq!(resolver.resolve(10.5, 11.5), 3);
    }

    #[test]
    fn test_range_mapping_skips_malformed_entries() {
        let mapping = SpeakerMapping::from_json(&json!({
            "start-end": "speaker_4",
            "1.0-2.0-3.0": "speaker_5",
            "0.0-2.0": "speaker_alice",
            "2.0-4.0": "speaker_bob",
            "4.0-6.0": "speaker_2"
        }))
        .unwrap();
        let SpeakerMapping::Ranges(intervals) = &mapping else {
            panic!("expected range mapping");
        };
        assert_eq!(intervals.len(), 1);

        let resolver = SpeakerResolver::new(None, Some(mapping), &Default::default());
        assert_eq!(resolver.resolve(0.5, 1.0), 0);
        assert_eq!(resolver.resolve(4.5, 5.0), 2);
    }

    #[test]
    fn test_unknown_mapping_shape_rejected() {
        assert!(matches!(
            SpeakerMapping::from_json(&json!("speaker_1")),
            Err(SpeakerError::InvalidMapping(_))
        ));
        assert!(matches!(
            SpeakerMapping::from_json(&json!([{"speaker_id": -1}])),
            Err(SpeakerError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_diarization_takes_priority() {
        let result = diarized(vec![segment(7, 0.0, 10.0)]);
        let resolver =
            SpeakerResolver::new(Some(result), Some(interval_mapping()), &Default::default());
        assert_eq!(resolver.source().name(), "diarization");
        assert_eq!(resolver.resolve(0.5, 1.0), 7);
    }

    #[test]
    fn test_diarization_half_open_and_nearest_edge() {
        let result = diarized(vec![
            segment(1, 0.0, 2.0),
            segment(2, 2.0, 4.0),
            segment(3, 6.0, 8.0),
        ]);
        let resolver = SpeakerResolver::new(Some(result), None, &Default::default());

        // Midpoint 2.0 belongs to the segment starting there.
        assert_eq!(resolver.resolve(1.5, 2.5), 2);
        // Gap [4, 6): closest edge wins.
        assert_eq!(resolver.resolve(4.2, 4.4), 2);
        assert_eq!(resolver.resolve(5.6, 5.8), 3);
        // Equidistant: earlier segment.
        assert_eq!(resolver.resolve(4.5, 5.5), 2);
        // Past the end.
        assert_eq!(resolver.resolve(12.0, 13.0), 3);
    }

    #[test]
    fn test_no_source_is_speaker_zero() {
        let resolver = SpeakerResolver::new(None, None, &Default::default());
        assert_eq!(resolver.source().name(), "default");
        assert_eq!(resolver.resolve(3.0, 4.0), 0);
    }

    #[test]
    fn test_speaker_map_names() {
        let config = SpeakersConfig {
            enable_diarization: false,
            default_speaker: Some(DefaultSpeakerConfig {
                name: "Narradora".to_string(),
                gender: "F".to_string(),
                region: "Medellín".to_string(),
            }),
        };
        let resolver = SpeakerResolver::new(None, Some(interval_mapping()), &config);

        assert_eq!(resolver.info_for(0).name, "Narradora");
        assert_eq!(resolver.info_for(0).gender, Gender::F);
        assert_eq!(resolver.info_for(1).name, UNKNOWN_SPEAKER_NAME);
        assert_eq!(resolver.info_for(2).name, "Carlos");
        assert_eq!(resolver.info_for(2).gender, Gender::M);
        assert_eq!(resolver.info_for(9).name, "Speaker 9");

        let empty = resolver.speaker_map(&[]);
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[&0].name, "Narradora");
    }

    #[test]
    fn test_parse_speaker_label() {
        let (id, info) = parse_speaker_label("1=Lucía:F:Bogotá").unwrap();
        assert_eq!(id, 1);
        assert_eq!(info.name, "Lucía");
        assert_eq!(info.gender, Gender::F);
        assert_eq!(info.region, "Bogotá");

        let (id, info) = parse_speaker_label("0=Andrés").unwrap();
        assert_eq!(id, 0);
        assert_eq!(info.gender, Gender::Unknown);
        assert_eq!(info.region, "Unknown");

        assert!(parse_speaker_label("Andrés").is_err());
        assert!(parse_speaker_label("x=Andrés").is_err());
        assert!(parse_speaker_label("2=").is_err());
        assert!(parse_speaker_label("2=Ana:X").is_err());
    }
}
