//! 16-bit PCM WAV file source, paced at the file's sample rate.

use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use super::{frames_to_duration, AudioSource, CaptureError};
use crate::params::Configuration;

/// Streams samples from a WAV file as if it were a capture device
pub struct WavSource {
    reader: hound::WavReader<BufReader<File>>,
    channels: usize,
    sample_rate: u32,
    /// Real-time pacing; off for tests and offline analysis
    paced: bool,
    started: Option<Instant>,
    frames_delivered: usize,
}

impl WavSource {
    /// Open a WAV file whose channel layout matches `config`
    pub fn open(path: impl AsRef<Path>, config: &Configuration) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(CaptureError::UnsupportedConfig(format!(
                "{} is not 16-bit integer PCM",
                path.display()
            )));
        }
        if usize::from(spec.channels) != config.channels() {
            return Err(CaptureError::UnsupportedConfig(format!(
                "{} has {} channel(s), {} mode needs {}",
                path.display(),
                spec.channels,
                config.mode,
                config.channels()
            )));
        }
        if spec.sample_rate != config.sample_rate {
            warn!(
                "{} is sampled at {}Hz, not {}Hz; using the file's rate",
                path.display(),
                spec.sample_rate,
                config.sample_rate
            );
        }

        info!(
            "Audio: {} @ {}Hz, {} channel(s), {:.1}s",
            path.display(),
            spec.sample_rate,
            spec.channels,
            reader.duration() as f64 / f64::from(spec.sample_rate)
        );

        Ok(Self {
            reader,
            channels: usize::from(spec.channels),
            sample_rate: spec.sample_rate,
            paced: true,
            started: None,
            frames_delivered: 0,
        })
    }

    /// Deliver blocks as fast as they are requested
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Sleep until the wall clock catches up with the samples handed out
    fn pace(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = started + frames_to_duration(self.frames_delivered, self.sample_rate);
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
    }
}

impl AudioSource for WavSource {
    fn read(&mut self, out: &mut [i16]) -> Result<(), CaptureError> {
        let mut filled = 0;
        for (dst, sample) in out.iter_mut().zip(self.reader.samples::<i16>()) {
            *dst = sample?;
            filled += 1;
        }
        if filled < out.len() {
            return Err(CaptureError::EndOfStream);
        }

        self.frames_delivered += out.len() / self.channels;
        if self.paced {
            self.pace();
        }
        Ok(())
    }

    fn latency(&self) -> Result<Duration, CaptureError> {
        Ok(Duration::ZERO)
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
