//! PCM block to frequency bins.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::window::blackman_harris;
use crate::params::PCM_FULL_SCALE;

/// Windowing + forward transform for one fixed transform size.
///
/// The plan and every buffer are created in [`SpectralPipeline::new`] and
/// reused for each channel of each frame.
pub struct SpectralPipeline {
    size: usize,
    channels: usize,
    fft: Arc<dyn Fft<f64>>,
    windowed: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralPipeline {
    /// Plan the forward transform and allocate scratch storage
    pub fn new(transform_size: usize, channels: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(transform_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            size: transform_size,
            channels,
            fft,
            windowed: vec![0.0; transform_size],
            spectrum: vec![Complex::new(0.0, 0.0); transform_size],
            scratch,
        }
    }

    pub fn transform_size(&self) -> usize {
        self.size
    }

    /// Transform one channel of an interleaved PCM block.
    ///
    /// Returns all `transform_size` bins; the upper half mirrors the lower
    /// half since the input is real. The slice is overwritten by the next call.
    ///
    /// # Panics
    /// If `pcm` is not `transform_size * channels` long or `channel` is out of
    /// range.
    pub fn process(&mut self, pcm: &[i16], channel: usize) -> &[Complex<f64>] {
        assert_eq!(
            pcm.len(),
            self.size * self.channels,
            "PCM block length does not match transform size"
        );
        assert!(channel < self.channels, "channel {} out of range", channel);

        let span = self.size.saturating_sub(1);
        for (i, (slot, frame)) in self
            .windowed
            .iter_mut()
            .zip(pcm.chunks_exact(self.channels))
            .enumerate()
        {
            let sample = f64::from(frame[channel]) / PCM_FULL_SCALE;
            *slot = blackman_harris(sample, i, span);
        }

        for (bin, &sample) in self.spectrum.iter_mut().zip(&self.windowed) {
            *bin = Complex::new(sample, 0.0);
        }

        // In place: the spectrum buffer holds the input until this returns
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        &self.spectrum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_has_empty_spectrum() {
        let mut pipeline = SpectralPipeline::new(256, 2);
        let pcm = vec![0i16; 512];
        let bins = pipeline.process(&pcm, 1);
        assert_eq!(bins.len(), 256);
        assert!(bins.iter().all(|c| c.norm() == 0.0));
    }

    #[test]
    fn test_dc_block_lands_in_bin_zero() {
        let mut pipeline = SpectralPipeline::new(128, 1);
        let pcm = vec![16000i16; 128];
        let bins = pipeline.process(&pcm, 0);

        let dc = bins[0].norm();
        assert!(dc > 0.0);
        // Window leakage stays within the first few bins
        for bin in &bins[4..64] {
            assert!(bin.norm() < dc * 1e-2);
        }
    }

    #[test]
    fn test_channels_are_read_independently() {
        let mut pipeline = SpectralPipeline::new(64, 2);
        // Left carries a constant, right is silent
        let pcm: Vec<i16> = (0..128).map(|i| if i % 2 == 0 { 8000 } else { 0 }).collect();

        let left_dc = pipeline.process(&pcm, 0)[0].norm();
        let right_dc = pipeline.process(&pcm, 1)[0].norm();
        assert!(left_dc > 0.0);
        assert_eq!(right_dc, 0.0);
    }

    #[test]
    fn test_upper_half_mirrors_lower_half() {
        let mut pipeline = SpectralPipeline::new(64, 1);
        let pcm: Vec<i16> = (0..64).map(|i| ((i * 977) % 2001) as i16 - 1000).collect();
        let bins = pipeline.process(&pcm, 0).to_vec();
        for k in 1..32 {
            let mirror = bins[64 - k].conj();
            assert!((bins[k] - mirror).norm() < 1e-9);
        }
    }

    #[test]
    #[should_panic(expected = "PCM block length")]
    fn test_wrong_block_length_panics() {
        let mut pipeline = SpectralPipeline::new(64, 2);
        pipeline.process(&[0i16; 64], 0);
    }
}
