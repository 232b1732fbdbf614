//! Visual tuning for the spectrum polyline.
//!
//! These values were picked by eye, not derived. They are grouped here so a
//! different look only touches one struct.

use super::analysis::Mode;

/// Constants that shape how bin magnitudes land on screen
#[derive(Debug, Clone)]
pub struct DisplayTuning {
    /// Only the first `transform_size / bin_divisor` bins are drawn.
    /// 3 spends the display width on the lower third of the spectrum.
    pub bin_divisor: u32,

    /// Multiplier applied after `log10(1 + |bin| / N)`
    pub gain: f32,

    /// Vertical scale when a single channel fills the display
    pub mono_scale: f32,

    /// Vertical scale for each half of a stereo display
    pub stereo_scale: f32,

    /// Baseline of the mono trace (NDC)
    pub mono_offset: f32,

    /// Baselines of the left and right traces (NDC): left in the upper half,
    /// right in the lower half
    pub stereo_offsets: [f32; 2],
}

impl Default for DisplayTuning {
    fn default() -> Self {
        Self {
            bin_divisor: 3,
            gain: 40.0,
            mono_scale: 4.0,
            stereo_scale: 1.0,
            mono_offset: -0.90,
            stereo_offsets: [0.05, -0.95],
        }
    }
}

impl DisplayTuning {
    /// Number of bins turned into vertices for a given transform size
    pub fn displayed_bins(&self, transform_size: u32) -> usize {
        (transform_size / self.bin_divisor.max(1)) as usize
    }

    pub fn scale(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Mono => self.mono_scale,
            Mode::Stereo => self.stereo_scale,
        }
    }

    pub fn offset(&self, mode: Mode, channel: usize) -> f32 {
        match mode {
            Mode::Mono => self.mono_offset,
            Mode::Stereo if channel == 0 => self.stereo_offsets[0],
            Mode::Stereo => self.stereo_offsets[1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displayed_bins_is_lower_third() {
        let tuning = DisplayTuning::default();
        assert_eq!(tuning.displayed_bins(512), 170);
        assert_eq!(tuning.displayed_bins(1024), 341);
        assert_eq!(tuning.displayed_bins(2), 0);
    }

    #[test]
    fn test_offsets_stack_stereo_channels() {
        let tuning = DisplayTuning::default();
        assert_eq!(tuning.offset(Mode::Mono, 0), -0.90);
        assert_eq!(tuning.offset(Mode::Stereo, 0), 0.05);
        assert_eq!(tuning.offset(Mode::Stereo, 1), -0.95);
        assert_eq!(tuning.scale(Mode::Mono), 4.0);
        assert_eq!(tuning.scale(Mode::Stereo), 1.0);
    }
}
