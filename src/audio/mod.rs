//! Audio sources feeding the frame loop.
//!
//! Every source hands out interleaved signed 16-bit PCM through a blocking
//! [`AudioSource::read`]. The read is the loop's only wait, so sources that
//! are not backed by hardware pace themselves.

mod device;
mod synthetic;
mod wav;

use std::fmt;
use std::time::Duration;

pub use device::DeviceSource;
pub use synthetic::SineSource;
pub use wav::WavSource;

/// Blocking supplier of interleaved PCM blocks
pub trait AudioSource {
    /// Fill `out` completely, blocking until enough samples are available
    fn read(&mut self, out: &mut [i16]) -> Result<(), CaptureError>;

    /// Delay between capture and availability to the reader
    fn latency(&self) -> Result<Duration, CaptureError>;

    fn channels(&self) -> usize;

    fn sample_rate(&self) -> u32;
}

/// Audio source failures
#[derive(Debug)]
pub enum CaptureError {
    /// No usable capture device
    NoDevice,
    /// Device does not offer the requested layout
    UnsupportedConfig(String),
    /// Device enumeration or query failed
    Device(String),
    /// Stream could not be built, started, or broke while running
    Stream(String),
    /// WAV file could not be read
    Wav(hound::Error),
    /// Source has no more samples
    EndOfStream,
    /// Backend cannot report latency (yet)
    LatencyUnavailable,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoDevice => write!(f, "No audio input device found"),
            CaptureError::UnsupportedConfig(msg) => write!(f, "Unsupported capture config: {}", msg),
            CaptureError::Device(msg) => write!(f, "Audio device error: {}", msg),
            CaptureError::Stream(msg) => write!(f, "Audio stream error: {}", msg),
            CaptureError::Wav(err) => write!(f, "WAV error: {}", err),
            CaptureError::EndOfStream => write!(f, "End of audio stream"),
            CaptureError::LatencyUnavailable => write!(f, "Latency not available"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Wav(err) => Some(err),
            _ => None,
        }
    }
}

impl From<hound::Error> for CaptureError {
    fn from(err: hound::Error) -> Self {
        CaptureError::Wav(err)
    }
}

impl From<cpal::DevicesError> for CaptureError {
    fn from(err: cpal::DevicesError) -> Self {
        CaptureError::Device(format!("Failed to enumerate devices: {}", err))
    }
}

impl From<cpal::SupportedStreamConfigsError> for CaptureError {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        CaptureError::Device(format!("Failed to get supported stream configs: {}", err))
    }
}

impl From<cpal::BuildStreamError> for CaptureError {
    fn from(err: cpal::BuildStreamError) -> Self {
        CaptureError::Stream(format!("Failed to build input stream: {}", err))
    }
}

impl From<cpal::PlayStreamError> for CaptureError {
    fn from(err: cpal::PlayStreamError) -> Self {
        CaptureError::Stream(format!("Failed to start input stream: {}", err))
    }
}

impl From<cpal::StreamError> for CaptureError {
    fn from(err: cpal::StreamError) -> Self {
        CaptureError::Stream(err.to_string())
    }
}

/// Time covered by `frames` frames at `sample_rate`
pub(crate) fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / f64::from(sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_to_duration() {
        assert_eq!(frames_to_duration(44100, 44100), Duration::from_secs(1));
        assert_eq!(frames_to_duration(512, 0), Duration::ZERO);
        let half = frames_to_duration(24000, 48000);
        assert!((half.as_secs_f64() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_error_messages_surface_backend_text() {
        let err = CaptureError::Stream("device unplugged".to_string());
        assert_eq!(err.to_string(), "Audio stream error: device unplugged");
    }
}
