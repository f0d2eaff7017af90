//! Boundary classification between consecutive words.
//!
//! Continuous Colombian Spanish often has no silence between words. A
//! fixed padding buffer around such a word would cut into its neighbour,
//! so buffering is decided per boundary from the gap classification.

use palabra_audio::ClipWindow;
use palabra_config::BufferingConfig;
use palabra_entities::Entity;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// Boundaries touch within the zero-gap tolerance. Never buffered.
    ZeroGap,
    /// The earlier word ends after the next one starts. Diagnostic only.
    Overlap,
    Normal,
}

/// One consecutive pair in start-time order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjacentPair {
    pub current_id: String,
    pub next_id: String,
    /// `next.start_time - current.end_time`, negative on overlap.
    pub gap: f64,
    pub kind: GapKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjacencyReport {
    pub pairs: Vec<AdjacentPair>,
    pub zero_gap_pairs: usize,
    pub overlap_pairs: usize,
    pub normal_gap_pairs: usize,
    /// Clip padding per entity, in the order of the analyzed slice.
    #[serde(skip)]
    pub windows: Vec<ClipWindow>,
}

impl AdjacencyReport {
    pub fn total_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn zero_gap_percentage(&self) -> f64 {
        if self.pairs.is_empty() {
            0.0
        } else {
            self.zero_gap_pairs as f64 / self.pairs.len() as f64 * 100.0
        }
    }

    /// Selection reason recorded on an extracted clip.
    pub fn selection_reason(&self, index: usize) -> &'static str {
        match self.windows.get(index) {
            Some(window) if window.is_unbuffered() => "unbuffered_adjacent_boundaries",
            Some(window) if window.lead > 0.0 && window.trail > 0.0 => "buffered",
            _ => "partially_buffered",
        }
    }
}

pub struct AdjacencyAnalyzer {
    buffer: f64,
    zero_gap_tolerance: f64,
}

impl AdjacencyAnalyzer {
    pub fn new(config: &BufferingConfig) -> Self {
        Self {
            buffer: config.buffer_secs(),
            zero_gap_tolerance: config.zero_gap_tolerance,
        }
    }

    pub fn classify(&self, current: &Entity, next: &Entity) -> GapKind {
        let gap = next.start_time() - current.end_time();
        if gap.abs() < self.zero_gap_tolerance {
            GapKind::ZeroGap
        } else if current.end_time() > next.start_time() {
            GapKind::Overlap
        } else {
            GapKind::Normal
        }
    }

    /// Classify every consecutive pair in start-time order and plan the
    /// clip buffer for each entity. The input sequence is left untouched.
    pub fn analyze(&self, entities: &[Entity]) -> AdjacencyReport {
        let mut order: Vec<usize> = (0..entities.len()).collect();
        order.sort_by(|&a, &b| entities[a].start_time().total_cmp(&entities[b].start_time()));

        let mut report = AdjacencyReport {
            windows: vec![ClipWindow::symmetric(self.buffer); entities.len()],
            ..AdjacencyReport::default()
        };

        for step in order.windows(2) {
            let (current, next) = (&entities[step[0]], &entities[step[1]]);
            let gap = next.start_time() - current.end_time();
            let kind = self.classify(current, next);

            let boundary_buffer = match kind {
                GapKind::ZeroGap => {
                    report.zero_gap_pairs += 1;
                    0.0
                }
                GapKind::Overlap => {
                    report.overlap_pairs += 1;
                    tracing::warn!(
                        current_word = current.text(),
                        next_word = next.text(),
                        current_end = current.end_time(),
                        next_start = next.start_time(),
                        "word_overlap_detected"
                    );
                    0.0
                }
                GapKind::Normal => {
                    report.normal_gap_pairs += 1;
                    self.buffer.min(gap / 2.0)
                }
            };
            report.windows[step[0]].trail = boundary_buffer;
            report.windows[step[1]].lead = boundary_buffer;

            report.pairs.push(AdjacentPair {
                current_id: current.entity_id().to_string(),
                next_id: next.entity_id().to_string(),
                gap,
                kind,
            });
        }

        let zero_gap_percentage = format!("{:.1}%", report.zero_gap_percentage());
        tracing::info!(
            total_word_pairs = report.total_pairs(),
            zero_gaps = report.zero_gap_pairs,
            overlaps = report.overlap_pairs,
            zero_gap_percentage = %zero_gap_percentage,
            "adjacency_analysis_completed"
        );
        report
    }
}
