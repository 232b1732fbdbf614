//! Blackman-Harris window.

use std::f64::consts::TAU;

/// Four-term Blackman-Harris coefficients `a0..a3`
pub const BLACKMAN_HARRIS: [f64; 4] = [0.35875, 0.48829, 0.14128, 0.01168];

/// Taper one sample of a block with the Blackman-Harris window.
///
/// `span` is the last sample index of the block (`transform_size - 1`), so
/// both block edges fall on the window's minimum.
pub fn blackman_harris(sample: f64, index: usize, span: usize) -> f64 {
    let [a0, a1, a2, a3] = BLACKMAN_HARRIS;
    let offset = if span == 0 {
        0.0
    } else {
        TAU * index as f64 / span as f64
    };
    sample * (a0 - a1 * offset.cos() - a2 * (2.0 * offset).cos() - a3 * (3.0 * offset).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_at_zero_is_coefficient_difference() {
        let [a0, a1, a2, a3] = BLACKMAN_HARRIS;
        for span in [1, 3, 511, 1023, 65535] {
            assert_eq!(blackman_harris(1.0, 0, span), a0 - a1 - a2 - a3);
        }
    }

    #[test]
    fn test_window_centre_and_far_edge() {
        let [a0, a1, a2, a3] = BLACKMAN_HARRIS;
        let span = 1024;

        // cos(pi), cos(2pi), cos(3pi)
        let centre = blackman_harris(1.0, span / 2, span);
        assert!((centre - (a0 + a1 - a2 + a3)).abs() < 1e-12);

        // The last sample wraps to a full period and matches the first
        let edge = blackman_harris(1.0, span, span);
        assert!((edge - blackman_harris(1.0, 0, span)).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_block_has_no_nan() {
        assert!(blackman_harris(0.25, 0, 0).is_finite());
    }

    #[test]
    fn test_window_is_symmetric_and_linear_in_sample() {
        let span = 511;
        for i in 0..=span {
            let left = blackman_harris(0.5, i, span);
            let right = blackman_harris(0.5, span - i, span);
            assert!((left - right).abs() < 1e-12);
            assert!((blackman_harris(-1.0, i, span) + 2.0 * left).abs() < 1e-12);
        }
    }
}
