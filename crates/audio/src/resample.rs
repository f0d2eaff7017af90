use rubato::{FftFixedIn, Resampler as RubatoResampler};

/// Offline wrapper around the rubato FFT resampler.
///
/// Feeds fixed-size chunks, zero-pads the tail and trims the filter delay so
/// the output lines up with the input timeline.
pub(crate) struct SincResampler {
    resampler: FftFixedIn<f32>,
    chunk_size: usize,
    from_rate: u32,
    to_rate: u32,
}

impl SincResampler {
    pub(crate) fn new(from_rate: u32, to_rate: u32) -> crate::Result<Self> {
        let chunk_size = 1024;

        let resampler = FftFixedIn::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            chunk_size,
            2, // Sub-chunks for better quality
            1, // Mono channel
        )
        .map_err(|e| crate::AudioError::Resample(e.to_string()))?;

        Ok(Self {
            resampler,
            chunk_size,
            from_rate,
            to_rate,
        })
    }

    pub(crate) fn process_all(&mut self, samples: &[f32]) -> crate::Result<Vec<f32>> {
        let expected =
            (samples.len() as f64 * self.to_rate as f64 / self.from_rate as f64).round() as usize;
        let delay = self.resampler.output_delay();

        let mut output = Vec::with_capacity(expected + delay + self.chunk_size);
        let mut chunk = vec![0.0f32; self.chunk_size];
        let mut offset = 0;

        while output.len() < expected + delay {
            let remaining = samples.len().saturating_sub(offset);
            let take = remaining.min(self.chunk_size);
            chunk[..take].copy_from_slice(&samples[offset..offset + take]);
            chunk[take..].fill(0.0);
            offset += take;

            let resampled = self
                .resampler
                .process(&[chunk.as_slice()], None)
                .map_err(|e| crate::AudioError::Resample(e.to_string()))?;
            if let Some(channel) = resampled.first() {
                output.extend_from_slice(channel);
            }
        }

        output.drain(..delay.min(output.len()));
        output.truncate(expected);
        Ok(output)
    }
}

#[inline]
pub(crate) fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let mut output = Vec::with_capacity(samples.len() / channels);
    let inv_channels = 1.0 / channels as f32;

    for chunk in samples.chunks_exact(channels) {
        let sum: f32 = chunk.iter().sum();
        output.push(sum * inv_channels);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mono_averages_frames() {
        let mono = to_mono(&[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }

    #[test]
    fn test_resample_length() {
        let input: Vec<f32> = (0..44100)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44100.0).sin() * 0.5)
            .collect();
        let mut resampler = SincResampler::new(44100, 16000).unwrap();
        let output = resampler.process_all(&input).unwrap();

        assert_eq!(output.len(), 16000);
        let peak = output.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.3 && peak < 0.7, "peak {peak}");
    }
}
