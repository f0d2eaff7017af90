use serde::{Deserialize, Serialize};

use crate::{DiarizationError, Result};

/// Maximum pairwise overlap accepted between segments, in seconds.
pub const DEFAULT_OVERLAP_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub speaker_id: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f64,
}

impl SpeakerSegment {
    pub fn new(speaker_id: u32, start_time: f64, end_time: f64, confidence: f64) -> Result<Self> {
        if !start_time.is_finite() || !end_time.is_finite() || end_time <= start_time {
            return Err(DiarizationError::InvalidSegment(format!(
                "end_time must be greater than start_time ({start_time} -> {end_time})"
            )));
        }
        if start_time < 0.0 {
            return Err(DiarizationError::InvalidSegment(format!(
                "start_time must be >= 0 (got {start_time})"
            )));
        }
        if !(confidence > 0.0 && confidence <= 1.0) {
            return Err(DiarizationError::InvalidSegment(format!(
                "confidence must be within (0, 1] (got {confidence})"
            )));
        }
        Ok(Self {
            speaker_id,
            start_time,
            end_time,
            confidence,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Half-open containment: `[start_time, end_time)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Distance from `time` to the nearest edge of this segment.
    pub fn edge_distance(&self, time: f64) -> f64 {
        (time - self.start_time).abs().min((time - self.end_time).abs())
    }
}

/// Speakers and mutually non-overlapping segments for one recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiarizationResult {
    speakers: Vec<u32>,
    segments: Vec<SpeakerSegment>,
    audio_duration: f64,
    processing_time: f64,
}

impl DiarizationResult {
    pub fn new(
        speakers: Vec<u32>,
        segments: Vec<SpeakerSegment>,
        audio_duration: f64,
        processing_time: f64,
    ) -> Result<Self> {
        Self::with_tolerance(
            speakers,
            segments,
            audio_duration,
            processing_time,
            DEFAULT_OVERLAP_TOLERANCE,
        )
    }

    /// Reject any pair of segments overlapping by more than `tolerance`.
    /// Checked on a start-sorted copy; the given order is kept.
    pub fn with_tolerance(
        speakers: Vec<u32>,
        segments: Vec<SpeakerSegment>,
        audio_duration: f64,
        processing_time: f64,
        tolerance: f64,
    ) -> Result<Self> {
        let mut sorted: Vec<&SpeakerSegment> = segments.iter().collect();
        sorted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        // After sorting, the furthest end seen so far bounds every later start.
        let mut furthest: Option<&SpeakerSegment> = None;
        for segment in sorted {
            if let Some(prev) = furthest {
                let overlap = prev.end_time - segment.start_time;
                if overlap > tolerance {
                    return Err(DiarizationError::OverlappingSegments {
                        first: (prev.start_time, prev.end_time),
                        second: (segment.start_time, segment.end_time),
                    });
                }
                if segment.end_time > prev.end_time {
                    furthest = Some(segment);
                }
            } else {
                furthest = Some(segment);
            }
        }

        Ok(Self {
            speakers,
            segments,
            audio_duration,
            processing_time,
        })
    }

    /// One speaker (id 0) covering `[0, max(1, duration)]` with confidence 1.0.
    pub fn single_speaker(duration: f64, processing_time: f64) -> Self {
        let valid_duration = if duration.is_finite() && duration > 0.0 {
            duration.max(1.0)
        } else {
            1.0
        };
        Self {
            speakers: vec![0],
            segments: vec![SpeakerSegment {
                speaker_id: 0,
                start_time: 0.0,
                end_time: valid_duration,
                confidence: 1.0,
            }],
            audio_duration: valid_duration,
            processing_time,
        }
    }

    pub fn speakers(&self) -> &[u32] {
        &self.speakers
    }

    pub fn segments(&self) -> &[SpeakerSegment] {
        &self.segments
    }

    pub fn audio_duration(&self) -> f64 {
        self.audio_duration
    }

    pub fn processing_time(&self) -> f64 {
        self.processing_time
    }

    /// Summed segment length divided by `duration`.
    pub fn coverage(&self, duration: f64) -> f64 {
        if duration <= 0.0 {
            return 0.0;
        }
        self.segments.iter().map(SpeakerSegment::duration).sum::<f64>() / duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: u32, start: f64, end: f64) -> SpeakerSegment {
        SpeakerSegment::new(id, start, end, 0.9).unwrap()
    }

    #[test]
    fn test_segment_validation() {
        assert!(SpeakerSegment::new(0, 1.0, 1.0, 0.9).is_err());
        assert!(SpeakerSegment::new(0, 2.0, 1.0, 0.9).is_err());
        assert!(SpeakerSegment::new(0, 0.0, 1.0, 0.0).is_err());
        assert!(SpeakerSegment::new(0, 0.0, 1.0, 1.1).is_err());
        assert!(SpeakerSegment::new(0, -0.5, 1.0, 0.5).is_err());
        assert!(SpeakerSegment::new(3, 0.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_half_open_containment() {
        let s = seg(0, 1.0, 2.0);
        assert!(s.contains(1.0));
        assert!(s.contains(1.999));
        assert!(!s.contains(2.0));
        assert!((s.edge_distance(2.3) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_rejected() {
        let result = DiarizationResult::new(
            vec![0, 1],
            vec![seg(0, 0.0, 5.0), seg(1, 4.5, 8.0)],
            8.0,
            0.1,
        );
        assert!(matches!(
            result,
            Err(DiarizationError::OverlappingSegments { .. })
        ));
    }

    #[test]
    fn test_overlap_within_tolerance_and_unsorted_input() {
        let result = DiarizationResult::new(
            vec![0, 1],
            vec![seg(1, 5.0, 8.0), seg(0, 0.0, 5.005)],
            8.0,
            0.1,
        )
        .unwrap();
        // Stored order is preserved.
        assert_eq!(result.segments()[0].speaker_id, 1);
    }

    #[test]
    fn test_nested_segment_rejected() {
        let result = DiarizationResult::new(
            vec![0, 1],
            vec![seg(0, 0.0, 10.0), seg(1, 2.0, 3.0), seg(1, 11.0, 12.0)],
            12.0,
            0.1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_single_speaker() {
        let result = DiarizationResult::single_speaker(12.5, 0.0);
        assert_eq!(result.speakers(), &[0]);
        assert_eq!(result.segments().len(), 1);
        assert!((result.segments()[0].end_time - 12.5).abs() < 1e-9);
        assert!((result.segments()[0].confidence - 1.0).abs() < 1e-9);

        let short = DiarizationResult::single_speaker(0.4, 0.0);
        assert!((short.segments()[0].end_time - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage() {
        let result =
            DiarizationResult::new(vec![0], vec![seg(0, 0.0, 2.0), seg(0, 4.0, 5.0)], 10.0, 0.0)
                .unwrap();
        assert!((result.coverage(10.0) - 0.3).abs() < 1e-9);
        assert_eq!(result.coverage(0.0), 0.0);
    }
}
