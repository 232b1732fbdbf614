//! Frame loop: audio block in, one line strip per channel out.

use log::{debug, info, warn};

use crate::audio::AudioSource;
use crate::error::Error;
use crate::params::{Configuration, DisplayTuning};
use crate::rendering::{Renderer, Vertex};
use crate::spectrum::{SpectralPipeline, VertexMapper};

/// Loop lifecycle; `ShuttingDown` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// Summary returned when the loop ends cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
}

/// Owns every buffer the loop touches; nothing is allocated per frame.
///
/// The blocking [`AudioSource::read`] paces the loop, no other rate limit is
/// applied.
pub struct FrameLoop<A: AudioSource, R: Renderer> {
    config: Configuration,
    source: A,
    renderer: R,
    pipeline: SpectralPipeline,
    mapper: VertexMapper,
    pcm: Vec<i16>,
    vertices: Vec<Vertex>,
    state: LoopState,
    frames: u64,
}

impl<A: AudioSource, R: Renderer> FrameLoop<A, R> {
    pub fn new(config: Configuration, tuning: DisplayTuning, source: A, renderer: R) -> Self {
        let transform_size = config.transform_size as usize;
        let pipeline = SpectralPipeline::new(transform_size, config.channels());
        let mapper = VertexMapper::new(transform_size, config.mode, tuning);
        let vertices = Vec::with_capacity(mapper.displayed_bins());

        Self {
            config,
            source,
            renderer,
            pipeline,
            mapper,
            pcm: vec![0; config.block_len()],
            vertices,
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Run one iteration: read, latency, viewport, per-channel draw, present,
    /// events.
    ///
    /// A read, upload or present failure is returned and leaves the state
    /// unchanged; callers treat it as fatal.
    pub fn step(&mut self) -> Result<LoopState, Error> {
        if self.state == LoopState::ShuttingDown {
            return Ok(self.state);
        }

        self.source.read(&mut self.pcm)?;

        match self.source.latency() {
            Ok(latency) => debug!("Latency: {} usec", latency.as_micros()),
            Err(err) => warn!("Latency query failed: {}", err),
        }

        self.renderer.update_viewport();

        for channel in 0..self.config.channels() {
            let bins = self.pipeline.process(&self.pcm, channel);
            self.mapper.map_into(bins, channel, &mut self.vertices);
            self.renderer.upload_vertices(&self.vertices)?;
            self.renderer.draw_line_strip(self.vertices.len() as u32);
        }

        self.renderer.present()?;
        self.renderer.poll_events();
        self.frames += 1;

        if self.renderer.should_close() {
            self.state = LoopState::ShuttingDown;
        }
        Ok(self.state)
    }

    /// Step until the renderer asks to close or an error occurs
    pub fn run(&mut self) -> Result<FrameStats, Error> {
        if self.renderer.should_close() {
            self.state = LoopState::ShuttingDown;
        }

        while self.state == LoopState::Running {
            self.step()?;
        }

        info!("Shutting down after {} frames", self.frames);
        Ok(FrameStats {
            frames: self.frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CaptureError, SineSource};
    use crate::params::Mode;
    use crate::rendering::RenderError;
    use std::time::Duration;

    /// Records every strip it is asked to draw and closes after `close_after`
    /// presents
    #[derive(Default)]
    struct RecordingRenderer {
        uploaded: Vec<Vertex>,
        frame: Vec<Vec<Vertex>>,
        frames: Vec<Vec<Vec<Vertex>>>,
        viewport_updates: usize,
        events_polled: usize,
        close_after: usize,
    }

    impl RecordingRenderer {
        fn closing_after(frames: usize) -> Self {
            Self {
                close_after: frames,
                ..Default::default()
            }
        }
    }

    impl Renderer for RecordingRenderer {
        fn update_viewport(&mut self) -> (u32, u32) {
            self.viewport_updates += 1;
            (1024, 768)
        }

        fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<(), RenderError> {
            self.uploaded = vertices.to_vec();
            Ok(())
        }

        fn draw_line_strip(&mut self, vertex_count: u32) {
            self.frame
                .push(self.uploaded[..vertex_count as usize].to_vec());
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.frames.push(std::mem::take(&mut self.frame));
            Ok(())
        }

        fn poll_events(&mut self) {
            self.events_polled += 1;
        }

        fn should_close(&self) -> bool {
            self.frames.len() >= self.close_after
        }
    }

    /// Sine source whose reads start failing after `good_reads`
    struct FlakySource {
        inner: SineSource,
        good_reads: usize,
        latency_fails: bool,
    }

    impl AudioSource for FlakySource {
        fn read(&mut self, out: &mut [i16]) -> Result<(), CaptureError> {
            if self.good_reads == 0 {
                return Err(CaptureError::Stream("device unplugged".to_string()));
            }
            self.good_reads -= 1;
            self.inner.read(out)
        }

        fn latency(&self) -> Result<Duration, CaptureError> {
            if self.latency_fails {
                Err(CaptureError::LatencyUnavailable)
            } else {
                Ok(Duration::from_micros(1500))
            }
        }

        fn channels(&self) -> usize {
            self.inner.channels()
        }

        fn sample_rate(&self) -> u32 {
            self.inner.sample_rate()
        }
    }

    fn config(mode: Mode, transform_size: u32) -> Configuration {
        Configuration {
            mode,
            transform_size,
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_stereo_draws_two_strips_per_frame() {
        let config = config(Mode::Stereo, 512);
        let source = SineSource::new(1000.0, 44100, 2);
        let mut frame_loop = FrameLoop::new(
            config,
            DisplayTuning::default(),
            source,
            RecordingRenderer::closing_after(3),
        );

        let stats = frame_loop.run().unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(frame_loop.state(), LoopState::ShuttingDown);

        let renderer = frame_loop.renderer();
        assert_eq!(renderer.frames.len(), 3);
        assert_eq!(renderer.viewport_updates, 3);
        assert_eq!(renderer.events_polled, 3);
        for frame in &renderer.frames {
            assert_eq!(frame.len(), 2);
            assert!(frame.iter().all(|strip| strip.len() == 170));
        }
    }

    #[test]
    fn test_stereo_channels_are_stacked() {
        let source = SineSource::new(2000.0, 44100, 2);
        let mut frame_loop = FrameLoop::new(
            config(Mode::Stereo, 1024),
            DisplayTuning::default(),
            source,
            RecordingRenderer::closing_after(1),
        );
        frame_loop.run().unwrap();

        let frame = &frame_loop.renderer().frames[0];
        let left_floor = frame[0].iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let right_floor = frame[1].iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert!(left_floor >= 0.05);
        assert!(right_floor >= -0.95);
        assert!(left_floor > right_floor);
    }

    #[test]
    fn test_mono_draws_one_strip() {
        let source = SineSource::new(440.0, 44100, 1);
        let mut frame_loop = FrameLoop::new(
            config(Mode::Mono, 256),
            DisplayTuning::default(),
            source,
            RecordingRenderer::closing_after(2),
        );
        frame_loop.run().unwrap();

        let renderer = frame_loop.renderer();
        assert!(renderer.frames.iter().all(|frame| frame.len() == 1));
        assert_eq!(renderer.frames[0][0].len(), 85);
    }

    #[test]
    fn test_read_failure_stops_the_loop() {
        let source = FlakySource {
            inner: SineSource::new(440.0, 44100, 2),
            good_reads: 2,
            latency_fails: false,
        };
        let mut frame_loop = FrameLoop::new(
            config(Mode::Stereo, 128),
            DisplayTuning::default(),
            source,
            RecordingRenderer::closing_after(10),
        );

        let err = frame_loop.run().unwrap_err();
        assert!(matches!(err, Error::Capture(CaptureError::Stream(_))));
        assert_eq!(frame_loop.renderer().frames.len(), 2);
        assert_eq!(frame_loop.state(), LoopState::Running);
    }

    #[test]
    fn test_latency_failure_is_not_fatal() {
        let source = FlakySource {
            inner: SineSource::new(440.0, 44100, 1),
            good_reads: 5,
            latency_fails: true,
        };
        let mut frame_loop = FrameLoop::new(
            config(Mode::Mono, 128),
            DisplayTuning::default(),
            source,
            RecordingRenderer::closing_after(4),
        );

        assert_eq!(frame_loop.run().unwrap().frames, 4);
    }

    #[test]
    fn test_closed_renderer_runs_no_frames() {
        let source = SineSource::new(440.0, 44100, 2);
        let mut frame_loop = FrameLoop::new(
            config(Mode::Stereo, 128),
            DisplayTuning::default(),
            source,
            RecordingRenderer::closing_after(0),
        );

        assert_eq!(frame_loop.run().unwrap().frames, 0);
        assert!(frame_loop.renderer().frames.is_empty());
        assert_eq!(frame_loop.step().unwrap(), LoopState::ShuttingDown);
    }
}
