//! Audio Test Fixture Generator
//!
//! Writes sine-wave WAV files with hound

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f64,
    /// Peak amplitude relative to full scale
    pub amplitude: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 5.0,
            sample_rate: 44100,
            channels: 2,
            frequency: 440.0,
            amplitude: 0.5,
        }
    }
}

impl AudioConfig {
    /// Samples per channel
    pub fn total_samples(&self) -> usize {
        (self.duration_seconds * self.sample_rate as f64) as usize
    }
}

/// Generate a 32-bit float sine WAV file
pub fn generate_sine_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..config.total_samples() {
        let t = i as f64 / config.sample_rate as f64;
        let phase = 2.0 * std::f64::consts::PI * config.frequency * t;
        let sample = (config.amplitude * phase.sin()) as f32;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Generate `count` sine files named `test_track_NNN.wav` in `dir`
pub fn generate_test_library(
    dir: &Path,
    count: usize,
    config: &AudioConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    (0..count)
        .map(|i| generate_sine_wav(&dir.join(format!("test_track_{:03}.wav", i + 1)), config))
        .collect()
}
