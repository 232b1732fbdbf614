//! End-to-end checks of the signal path: synthetic audio in, vertices out.

use spectrum_scope::audio::{AudioSource, SineSource};
use spectrum_scope::params::{Configuration, DisplayTuning, Mode};
use spectrum_scope::spectrum::{SpectralPipeline, VertexMapper};

fn sine_block(frequency: f64, config: &Configuration) -> Vec<i16> {
    let mut source = SineSource::new(frequency, config.sample_rate, config.channels());
    let mut block = vec![0i16; config.block_len()];
    source.read(&mut block).unwrap();
    block
}

fn peak_bin(magnitudes: impl Iterator<Item = f64>) -> usize {
    magnitudes
        .enumerate()
        .skip(1)
        .fold((0, f64::MIN), |best, (i, m)| if m > best.1 { (i, m) } else { best })
        .0
}

#[test]
fn sine_peaks_at_expected_bin() {
    let cases = [
        (1000.0, 1024, 44100),
        (440.0, 512, 44100),
        (3000.0, 2048, 48000),
        (250.0, 256, 8000),
        (1234.5, 1024, 44100),
    ];

    for (frequency, size, rate) in cases {
        let config = Configuration {
            mode: Mode::Mono,
            transform_size: size,
            sample_rate: rate,
        };
        let block = sine_block(frequency, &config);
        let mut pipeline = SpectralPipeline::new(size as usize, 1);
        let bins = pipeline.process(&block, 0);

        let found = peak_bin(bins[..size as usize / 2].iter().map(|c| c.norm()));
        let expected = (frequency * f64::from(size) / f64::from(rate)).round() as usize;
        assert!(
            found.abs_diff(expected) <= 1,
            "{}Hz @ {}Hz, N={}: peak at {} expected {}",
            frequency,
            rate,
            size,
            found,
            expected
        );
    }
}

#[test]
fn vertex_peak_follows_spectral_peak() {
    let config = Configuration {
        mode: Mode::Stereo,
        transform_size: 1024,
        sample_rate: 44100,
    };
    let block = sine_block(5000.0, &config);
    let mut pipeline = SpectralPipeline::new(1024, 2);
    let mapper = VertexMapper::new(1024, Mode::Stereo, DisplayTuning::default());

    for channel in 0..2 {
        let vertices = mapper.map(pipeline.process(&block, channel), channel);
        assert_eq!(vertices.len(), 341);

        let found = peak_bin(vertices.iter().map(|v| f64::from(v.position[1])));
        assert!(found.abs_diff(116) <= 1, "channel {} peak at {}", channel, found);
    }
}

#[test]
fn identical_input_gives_identical_vertices() {
    let config = Configuration::default();
    let block = sine_block(2500.0, &config);
    let size = config.transform_size as usize;
    let mut pipeline = SpectralPipeline::new(size, config.channels());
    let mapper = VertexMapper::new(size, config.mode, DisplayTuning::default());

    let first = mapper.map(pipeline.process(&block, 0), 0);

    // Run the other channel in between to disturb any shared scratch state
    let _ = mapper.map(pipeline.process(&block, 1), 1);
    let second = mapper.map(pipeline.process(&block, 0), 0);

    let first_bits: Vec<[u32; 2]> = first
        .iter()
        .map(|v| [v.position[0].to_bits(), v.position[1].to_bits()])
        .collect();
    let second_bits: Vec<[u32; 2]> = second
        .iter()
        .map(|v| [v.position[0].to_bits(), v.position[1].to_bits()])
        .collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn fresh_pipeline_matches_reused_pipeline() {
    let config = Configuration {
        mode: Mode::Mono,
        transform_size: 256,
        sample_rate: 44100,
    };
    let noise_like = sine_block(97.0, &config);
    let tone = sine_block(6000.0, &config);
    let mapper = VertexMapper::new(256, Mode::Mono, DisplayTuning::default());

    let mut reused = SpectralPipeline::new(256, 1);
    let _ = reused.process(&noise_like, 0);
    let from_reused = mapper.map(reused.process(&tone, 0), 0);

    let mut fresh = SpectralPipeline::new(256, 1);
    let from_fresh = mapper.map(fresh.process(&tone, 0), 0);

    assert_eq!(from_reused, from_fresh);
}
