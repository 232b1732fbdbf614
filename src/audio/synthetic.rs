//! Synthetic sine source for demos and for driving the loop without hardware.

use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use super::{frames_to_duration, AudioSource, CaptureError};

/// Deterministic sine wave written identically to every channel
#[derive(Debug, Clone)]
pub struct SineSource {
    frequency_hz: f64,
    amplitude: f64,
    sample_rate: u32,
    channels: usize,
    /// Frame index of the next sample, so consecutive blocks are continuous
    position: u64,
    paced: bool,
    started: Option<Instant>,
}

impl SineSource {
    /// Half-scale sine, unpaced
    pub fn new(frequency_hz: f64, sample_rate: u32, channels: usize) -> Self {
        Self {
            frequency_hz,
            amplitude: 0.5,
            sample_rate,
            channels: channels.max(1),
            position: 0,
            paced: false,
            started: None,
        }
    }

    /// Peak level as a fraction of i16 full scale (clamped to 0..=1)
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    /// Hand out blocks no faster than a device would at this sample rate
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    /// Sample value at an absolute frame index
    pub fn sample_at(&self, frame: u64) -> i16 {
        let t = frame as f64 / f64::from(self.sample_rate.max(1));
        let value = self.amplitude * (TAU * self.frequency_hz * t).sin();
        (value * f64::from(i16::MAX)).round() as i16
    }
}

impl AudioSource for SineSource {
    fn read(&mut self, out: &mut [i16]) -> Result<(), CaptureError> {
        for frame in out.chunks_mut(self.channels) {
            let value = self.sample_at(self.position);
            frame.fill(value);
            self.position += 1;
        }

        if self.paced {
            let started = *self.started.get_or_insert_with(Instant::now);
            let due = started + frames_to_duration(self.position as usize, self.sample_rate);
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
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
