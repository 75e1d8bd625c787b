//! Normalizes decoded PCM into mono samples at [`TARGET_SAMPLE_RATE`].
//!
//! Call [`MonoResampler::finalize`] at end of stream to flush the resampler tail.

use anyhow::{Context, Result, anyhow, bail};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};

use super::TARGET_SAMPLE_RATE;

/// Source frames fed to rubato per `process()` call.
const RESAMPLE_BLOCK_FRAMES: usize = 2048;

/// Downmixes decoded buffers to mono and resamples them when the source rate differs.
#[derive(Default)]
pub struct MonoResampler {
    // Scratch buffer used to copy decoded PCM into an interleaved `Vec<f32>`.
    sample_buf: Option<SampleBuffer<f32>>,

    // Created on the first buffer whose rate differs from the target.
    resampler: Option<SincFixedIn<f32>>,

    // Mono source samples waiting for a full rubato block.
    pending: Vec<f32>,
}

impl MonoResampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the samples of one decoded Symphonia buffer to `out`.
    pub fn push_decoded(&mut self, decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) -> Result<()> {
        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 {
            bail!("decoded audio had zero channels");
        }

        let buf = self
            .sample_buf
            .get_or_insert_with(|| SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        buf.copy_interleaved_ref(decoded.clone());

        let mono = downmix_to_mono(buf.samples(), channels);
        self.push_mono(&mono, spec.rate, out)
    }

    /// Append mono samples at `src_rate` to `out`, resampling when needed.
    pub fn push_mono(&mut self, mono: &[f32], src_rate: u32, out: &mut Vec<f32>) -> Result<()> {
        if src_rate == TARGET_SAMPLE_RATE && self.resampler.is_none() {
            out.extend_from_slice(mono);
            return Ok(());
        }

        let rs = self.ensure_resampler(src_rate)?;
        let in_max = rs.input_frames_max();

        self.pending.extend_from_slice(mono);
        while self.pending.len() >= in_max {
            let block: Vec<f32> = self.pending.drain(..in_max).collect();
            self.resample_block(&block, out)?;
        }

        Ok(())
    }

    /// Flush buffered samples at end of stream. No-op if resampling was never needed.
    pub fn finalize(&mut self, out: &mut Vec<f32>) -> Result<()> {
        let Some(rs) = self.resampler.as_ref() else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }

        // rubato expects exact block sizes; pad the remainder with silence.
        let in_max = rs.input_frames_max();
        let mut block = std::mem::take(&mut self.pending);
        block.resize(in_max, 0.0);
        self.resample_block(&block, out)
    }

    fn ensure_resampler(&mut self, src_rate: u32) -> Result<&SincFixedIn<f32>> {
        if self.resampler.is_none() {
            if src_rate == 0 {
                bail!("decoded audio reported a 0 Hz sample rate");
            }

            let rs = SincFixedIn::<f32>::new(
                TARGET_SAMPLE_RATE as f64 / src_rate as f64,
                2.0,
                SincInterpolationParameters {
                    sinc_len: 256,
                    f_cutoff: 0.95,
                    interpolation: SincInterpolationType::Linear,
                    oversampling_factor: 256,
                    window: WindowFunction::BlackmanHarris2,
                },
                RESAMPLE_BLOCK_FRAMES,
                1,
            )
            .map_err(|e| anyhow!(e))
            .context("failed to init resampler")?;

            self.resampler = Some(rs);
        }

        self.resampler
            .as_ref()
            .ok_or_else(|| anyhow!("resampler not initialized"))
    }

    fn resample_block(&mut self, block: &[f32], out: &mut Vec<f32>) -> Result<()> {
        let rs = self
            .resampler
            .as_mut()
            .ok_or_else(|| anyhow!("resampler not initialized"))?;

        let input = [block];
        let resampled = rs
            .process(&input[..], None)
            .map_err(|e| anyhow!(e))
            .context("resampler process failed")?;

        let [mono] = resampled.as_slice() else {
            bail!("expected mono output from resampler");
        };
        out.extend_from_slice(mono);
        Ok(())
    }
}

/// Downmix interleaved samples into mono by averaging channels.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_is_noop_without_resampler() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut rs = MonoResampler::new();
        rs.push_mono(&[0.5; 10], TARGET_SAMPLE_RATE, &mut out)?;
        rs.finalize(&mut out)?;
        assert_eq!(out, vec![0.5; 10]);
        Ok(())
    }

    #[test]
    fn downmix_to_mono_single_channel_is_identity() {
        let input = vec![0.0, 1.0, -1.0];
        assert_eq!(downmix_to_mono(&input, 1), input);
    }

    #[test]
    fn downmix_to_mono_averages_channels() {
        // (L=1, R=3), (L=-1, R=1) => 2, 0
        let interleaved = vec![1.0, 3.0, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&interleaved, 2), vec![2.0, 0.0]);
    }

    #[test]
    fn resample_block_errors_when_resampler_is_missing() {
        let mut rs = MonoResampler::new();
        let err = rs.resample_block(&[0.0; 16], &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("resampler not initialized"));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let mut rs = MonoResampler::new();
        let err = rs.push_mono(&[0.0; 4], 0, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("0 Hz"));
    }

    #[test]
    fn upsampling_doubles_length_after_finalize() -> anyhow::Result<()> {
        let mut rs = MonoResampler::new();
        let mut out = Vec::new();

        // Two full blocks plus a remainder that `finalize()` flushes.
        rs.push_mono(&vec![0.0; RESAMPLE_BLOCK_FRAMES * 2 + 7], 8_000, &mut out)?;
        assert_eq!(rs.pending.len(), 7);
        let before_finalize = out.len();

        rs.finalize(&mut out)?;
        assert!(rs.pending.is_empty());
        assert!(out.len() > before_finalize);

        // 8 kHz -> 16 kHz over three input blocks (the last one zero-padded).
        let expected = (RESAMPLE_BLOCK_FRAMES * 3 * 2) as i64;
        assert!((out.len() as i64 - expected).abs() <= 2, "got {}", out.len());
        Ok(())
    }
}
