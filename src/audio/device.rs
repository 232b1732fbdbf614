//! Capture from the default input device via cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use log::{error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::{frames_to_duration, AudioSource, CaptureError};
use crate::params::Configuration;

/// PCM blocks the callback may queue ahead of the reader before dropping
const BUFFERED_BLOCKS: usize = 8;

/// State written by the audio callback and drained by the reader
struct Captured {
    samples: VecDeque<i16>,
    capacity: usize,
    /// Capture-to-callback delay of the most recent callback
    device_latency: Option<Duration>,
    /// Samples discarded because the reader fell behind
    dropped: usize,
    failure: Option<String>,
}

struct Shared {
    state: Mutex<Captured>,
    ready: Condvar,
}

/// Input stream on the default capture device.
///
/// The stream closes when this is dropped.
pub struct DeviceSource {
    shared: Arc<Shared>,
    channels: usize,
    sample_rate: u32,
    reported_drops: usize,
    _stream: cpal::Stream,
}

impl DeviceSource {
    /// Open and start a capture stream matching `config`
    pub fn open(config: &Configuration) -> Result<Self, CaptureError> {
        let channels = config.channels();
        let rate = cpal::SampleRate(config.sample_rate);

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .supported_input_configs()?
            .filter(|range| {
                usize::from(range.channels()) == channels
                    && range.min_sample_rate() <= rate
                    && rate <= range.max_sample_rate()
            })
            .max_by_key(|range| format_preference(range.sample_format()))
            .ok_or_else(|| {
                CaptureError::UnsupportedConfig(format!(
                    "{} does not offer {} channel(s) at {}Hz",
                    name, channels, config.sample_rate
                ))
            })?;

        let stream_config = cpal::StreamConfig {
            channels: channels as cpal::ChannelCount,
            sample_rate: rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(Captured {
                samples: VecDeque::with_capacity(config.block_len() * BUFFERED_BLOCKS),
                capacity: config.block_len() * BUFFERED_BLOCKS,
                device_latency: None,
                dropped: 0,
                failure: None,
            }),
            ready: Condvar::new(),
        });

        let format = supported.sample_format();
        let stream = match format {
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, &shared)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, &shared)?,
            SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, &shared)?,
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, &shared)?,
            SampleFormat::F64 => build_stream::<f64>(&device, &stream_config, &shared)?,
            other => {
                return Err(CaptureError::UnsupportedConfig(format!(
                    "sample format {:?}",
                    other
                )))
            }
        };

        stream.play()?;

        info!(
            "Audio: {} @ {}Hz, {} channel(s), {:?} converted to i16",
            name, config.sample_rate, channels, format
        );

        Ok(Self {
            shared,
            channels,
            sample_rate: config.sample_rate,
            reported_drops: 0,
            _stream: stream,
        })
    }
}

impl AudioSource for DeviceSource {
    fn read(&mut self, out: &mut [i16]) -> Result<(), CaptureError> {
        let mut state = self.shared.state.lock().map_err(|_| poisoned())?;

        if out.len() > state.capacity {
            return Err(CaptureError::Stream(format!(
                "read of {} samples exceeds capture buffer of {}",
                out.len(),
                state.capacity
            )));
        }

        loop {
            if let Some(msg) = state.failure.take() {
                return Err(CaptureError::Stream(msg));
            }
            if state.samples.len() >= out.len() {
                break;
            }
            state = self.shared.ready.wait(state).map_err(|_| poisoned())?;
        }

        let n = out.len();
        for (dst, src) in out.iter_mut().zip(state.samples.drain(..n)) {
            *dst = src;
        }

        let dropped = state.dropped;
        drop(state);

        if dropped > self.reported_drops {
            warn!(
                "Capture overrun: {} samples dropped",
                dropped - self.reported_drops
            );
            self.reported_drops = dropped;
        }

        Ok(())
    }

    fn latency(&self) -> Result<Duration, CaptureError> {
        let state = self.shared.state.lock().map_err(|_| poisoned())?;
        let device_latency = state
            .device_latency
            .ok_or(CaptureError::LatencyUnavailable)?;
        let queued_frames = state.samples.len() / self.channels;
        Ok(device_latency + frames_to_duration(queued_frames, self.sample_rate))
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Native i16 first, then formats that convert without surprises
fn format_preference(format: SampleFormat) -> u8 {
    match format {
        SampleFormat::I16 => 3,
        SampleFormat::F32 => 2,
        SampleFormat::I32 => 1,
        _ => 0,
    }
}

fn poisoned() -> CaptureError {
    CaptureError::Stream("capture buffer lock poisoned".to_string())
}

/// Build an input stream converting `T` samples to i16 into the shared queue
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: &Arc<Shared>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let data_shared = Arc::clone(shared);
    let error_shared = Arc::clone(shared);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], info: &cpal::InputCallbackInfo| {
            let Ok(mut state) = data_shared.state.lock() else {
                return;
            };

            // Make room by discarding the oldest samples
            let overflow = (state.samples.len() + data.len()).saturating_sub(state.capacity);
            if overflow > 0 {
                let overflow = overflow.min(state.samples.len());
                state.samples.drain(..overflow);
                state.dropped += overflow;
            }

            state
                .samples
                .extend(data.iter().map(|&sample| i16::from_sample(sample)));

            let stamp = info.timestamp();
            state.device_latency = stamp.callback.duration_since(&stamp.capture);

            drop(state);
            data_shared.ready.notify_one();
        },
        move |err| {
            error!("Audio stream error: {}", err);
            if let Ok(mut state) = error_shared.state.lock() {
                state.failure = Some(err.to_string());
            }
            error_shared.ready.notify_one();
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_i16_preferred() {
        let mut formats = vec![SampleFormat::F32, SampleFormat::I16, SampleFormat::U8];
        formats.sort_by_key(|&f| std::cmp::Reverse(format_preference(f)));
        assert_eq!(formats[0], SampleFormat::I16);
        assert_eq!(formats[1], SampleFormat::F32);
    }

    #[test]
    fn test_float_samples_convert_to_full_scale_i16() {
        assert_eq!(i16::from_sample(0.0f32), 0);
        assert_eq!(i16::from_sample(1.0f32), i16::MAX);
        assert!(i16::from_sample(-1.0f32) <= -i16::MAX);
    }
}
