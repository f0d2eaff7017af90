use hound::{WavSpec, WavWriter};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use palabra_entities::Entity;

use crate::decode::ProcessedAudio;
use crate::{AudioError, Result};

/// Padding applied before and after a word when cutting its clip, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipWindow {
    pub lead: f64,
    pub trail: f64,
}

impl ClipWindow {
    pub const NONE: ClipWindow = ClipWindow {
        lead: 0.0,
        trail: 0.0,
    };

    pub fn symmetric(buffer: f64) -> Self {
        Self {
            lead: buffer,
            trail: buffer,
        }
    }

    pub fn is_unbuffered(&self) -> bool {
        self.lead == 0.0 && self.trail == 0.0
    }
}

/// `<entity_id>_<text>_<syllables>s_<confidence%>c_<duration_ms>ms.wav`
pub fn clip_file_name(entity: &Entity) -> String {
    let text: String = entity
        .text()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "{}_{}_{}s_{}c_{}ms.wav",
        entity.entity_id(),
        text,
        entity.syllable_count(),
        (entity.confidence() * 100.0).round() as u32,
        (entity.duration() * 1000.0).round() as u64,
    )
}

/// Write samples as a 16-bit mono WAV file.
pub fn write_wav_mono_i16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let write_err = |message: String| AudioError::Write {
        path: path.to_path_buf(),
        message,
    };
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let file = std::fs::File::create(path)
        .map_err(|e| write_err(format!("failed to create file: {e}")))?;
    let mut writer = WavWriter::new(BufWriter::new(file), spec)
        .map_err(|e| write_err(format!("failed to create wav writer: {e}")))?;

    for &sample in samples {
        let int_sample = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(int_sample)
            .map_err(|e| write_err(format!("failed to write sample: {e}")))?;
    }

    writer
        .finalize()
        .map_err(|e| write_err(format!("failed to finalize wav: {e}")))?;

    Ok(())
}

/// Cuts word clips out of a decoded recording.
pub struct ClipExtractor {
    output_dir: PathBuf,
}

impl ClipExtractor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| AudioError::Write {
            path: output_dir.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the clip for `entity` widened by `window` and clamped to the
    /// recording, then mark the entity as extracted.
    pub fn extract(
        &self,
        audio: &ProcessedAudio,
        entity: &mut Entity,
        window: ClipWindow,
        reason: &str,
    ) -> Result<PathBuf> {
        let rate = audio.sample_rate() as f64;
        let total = audio.samples().len();
        let start = (((entity.start_time() - window.lead).max(0.0)) * rate).floor() as usize;
        let end = (((entity.end_time() + window.trail) * rate).ceil() as usize).min(total);

        let path = self.output_dir.join(clip_file_name(entity));
        if start >= end {
            return Err(AudioError::OutsideRecording {
                entity_id: entity.entity_id().to_string(),
                duration: audio.duration(),
            });
        }

        write_wav_mono_i16(&path, &audio.samples()[start..end], audio.sample_rate())?;
        entity.mark_extracted(path.to_string_lossy(), Some(reason.to_string()));

        tracing::debug!(
            entity_id = entity.entity_id(),
            lead = window.lead,
            trail = window.trail,
            samples = end - start,
            "clip_extracted"
        );
        Ok(path)
    }
}
