//! Frequency bins to screen-space polyline.

use rustfft::num_complex::Complex;

use crate::params::{DisplayTuning, Mode};
use crate::rendering::Vertex;

/// Log-scaled bin magnitude, normalised by the transform size.
///
/// The `1 +` keeps silent bins at zero instead of a negative logarithm.
pub fn magnitude(bin: Complex<f64>, transform_size: usize, gain: f32) -> f32 {
    let re = bin.re as f32;
    let im = bin.im as f32;
    (1.0 + (re * re + im * im).sqrt() / transform_size as f32).log10() * gain
}

/// Maps the displayed bins of one channel onto a line strip
#[derive(Debug, Clone)]
pub struct VertexMapper {
    transform_size: usize,
    displayed: usize,
    mode: Mode,
    tuning: DisplayTuning,
}

impl VertexMapper {
    pub fn new(transform_size: usize, mode: Mode, tuning: DisplayTuning) -> Self {
        let displayed = tuning.displayed_bins(transform_size as u32);
        Self {
            transform_size,
            displayed,
            mode,
            tuning,
        }
    }

    /// Vertices produced per channel
    pub fn displayed_bins(&self) -> usize {
        self.displayed
    }

    /// Horizontal NDC position of a displayed bin, from -1.0 up to (not
    /// including) 1.0
    pub fn bin_x(&self, index: usize) -> f32 {
        (index as f32 / self.displayed as f32 - 0.5) * 2.0
    }

    /// Rebuild `out` with one vertex per displayed bin, in bin order.
    ///
    /// Does not allocate once `out` has `displayed_bins()` capacity.
    pub fn map_into(&self, bins: &[Complex<f64>], channel: usize, out: &mut Vec<Vertex>) {
        let scale = self.tuning.scale(self.mode);
        let offset = self.tuning.offset(self.mode, channel);

        out.clear();
        out.extend(
            bins.iter()
                .take(self.displayed)
                .enumerate()
                .map(|(i, &bin)| {
                    let y = magnitude(bin, self.transform_size, self.tuning.gain) * scale + offset;
                    Vertex::new(self.bin_x(i), y)
                }),
        );
    }

    pub fn map(&self, bins: &[Complex<f64>], channel: usize) -> Vec<Vertex> {
        let mut vertices = Vec::with_capacity(self.displayed);
        self.map_into(bins, channel, &mut vertices);
        vertices
    }
}
