//! Analysis configuration: channel mode, transform size and sample rate.

use std::fmt;

/// Largest value accepted for `-s` and `-r`.
///
/// Half of `u32::MAX` keeps `transform_size * channels` and the byte count of a
/// PCM block well inside `u32`.
pub const VALUE_LIMIT: u64 = (u32::MAX / 2) as u64;

/// Full-scale value of a signed 16-bit sample, used to normalise PCM input
pub const PCM_FULL_SCALE: f64 = 32767.0;

/// Channel layout of the captured stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One channel, drawn large across the whole display
    Mono,
    /// Two interleaved channels, left stacked above right
    Stereo,
}

impl Mode {
    /// Number of interleaved channels in a PCM block
    pub fn channels(self) -> usize {
        match self {
            Mode::Mono => 1,
            Mode::Stereo => 2,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Mono => write!(f, "Mono"),
            Mode::Stereo => write!(f, "Stereo"),
        }
    }
}

/// Resolved analysis configuration (immutable once the resolver hands it out)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub mode: Mode,

    /// Transform window in samples per channel (power of two, <= VALUE_LIMIT)
    pub transform_size: u32,

    /// Capture sample rate (Hz)
    pub sample_rate: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: Mode::Stereo,
            transform_size: 512,
            sample_rate: 44100,
        }
    }
}

impl Configuration {
    pub fn channels(&self) -> usize {
        self.mode.channels()
    }

    /// Length of one interleaved PCM block in samples
    pub fn block_len(&self) -> usize {
        self.transform_size as usize * self.channels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.mode, Mode::Stereo);
        assert_eq!(config.transform_size, 512);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.block_len(), 1024);
    }

    #[test]
    fn test_channel_count() {
        assert_eq!(Mode::Mono.channels(), 1);
        assert_eq!(Mode::Stereo.channels(), 2);
    }
}
