//! Onset envelope, autocorrelation tempogram and tempo estimation

use crate::audio::SpectralMatrix;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Tempogram window, in onset frames
pub const WIN_LENGTH: usize = 384;

/// Tempo prior center, in BPM
const START_BPM: f64 = 120.0;

/// Tempo prior spread, in octaves
const STD_BPM: f64 = 1.0;

const MIN_BPM: f64 = 30.0;
const MAX_BPM: f64 = 320.0;

const AMIN: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

/// Autocorrelation tempogram, one `[lag][frame]` matrix per channel
#[derive(Debug, Clone)]
pub struct Tempogram {
    pub channels: Vec<Vec<Vec<f64>>>,
    /// Onset frames per second
    pub frame_rate: f64,
}

impl Tempogram {
    /// Tempogram of every channel of a power spectrogram
    pub fn compute(power: &SpectralMatrix, sample_rate: u32) -> Self {
        let frame_rate = power.params.frame_rate(sample_rate);
        let channels = power
            .channels
            .iter()
            .map(|frames| autocorrelation_tempogram(&onset_strength(frames), WIN_LENGTH))
            .collect();
        Self {
            channels,
            frame_rate,
        }
    }

    /// BPM corresponding to autocorrelation lag `lag` (`inf` at lag 0)
    pub fn lag_bpm(&self, lag: usize) -> f64 {
        60.0 * self.frame_rate / lag as f64
    }

    /// Per-channel tempo estimate in BPM
    pub fn estimate_tempo(&self) -> Vec<f64> {
        self.channels
            .iter()
            .map(|matrix| self.channel_tempo(matrix))
            .collect()
    }

    fn channel_tempo(&self, matrix: &[Vec<f64>]) -> f64 {
        let mut best = (0.0, f64::NEG_INFINITY);
        for (lag, row) in matrix.iter().enumerate().skip(1) {
            let bpm = self.lag_bpm(lag);
            if !(MIN_BPM..=MAX_BPM).contains(&bpm) || row.is_empty() {
                continue;
            }
            let strength = row.iter().sum::<f64>() / row.len() as f64;
            let prior = -0.5 * ((bpm / START_BPM).log2() / STD_BPM).powi(2);
            let score = strength.max(AMIN).ln() + prior;
            if score > best.1 {
                best = (bpm, score);
            }
        }
        best.0
    }

    /// Flattened values of every channel, in `[channel][lag][frame]` order
    pub fn flatten(&self) -> Vec<f64> {
        self.channels
            .iter()
            .flat_map(|matrix| matrix.iter().flatten().copied())
            .collect()
    }
}

/// Spectral-flux onset strength of one channel
///
/// Power is converted to dB (clipped 80 dB below the peak), differenced
/// along time, half-wave rectified and averaged over frequency. The first
/// frame has no predecessor and reports 0.
pub fn onset_strength(power_frames: &[Vec<f32>]) -> Vec<f64> {
    let db: Vec<Vec<f64>> = power_frames
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&p| 10.0 * (p as f64).max(AMIN).log10())
                .collect()
        })
        .collect();
    let peak = db
        .iter()
        .flatten()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = peak - TOP_DB;

    let mut envelope = Vec::with_capacity(db.len());
    if db.is_empty() {
        return envelope;
    }
    envelope.push(0.0);
    for pair in db.windows(2) {
        let bins = pair[1].len().max(1) as f64;
        let flux: f64 = pair[0]
            .iter()
            .zip(&pair[1])
            .map(|(&prev, &cur)| (cur.max(floor) - prev.max(floor)).max(0.0))
            .sum();
        envelope.push(flux / bins);
    }
    envelope
}

/// Windowed local autocorrelation of an onset envelope, `[lag][frame]`
///
/// Each frame's window is centered on it (zero padded at the edges), Hann
/// weighted, and its autocorrelation normalized so lag 0 equals 1.
pub fn autocorrelation_tempogram(envelope: &[f64], win_length: usize) -> Vec<Vec<f64>> {
    let n_frames = envelope.len();
    let mut tempogram = vec![vec![0.0; n_frames]; win_length];
    if n_frames == 0 || win_length == 0 {
        return tempogram;
    }

    let window = hann(win_length);
    let pad = win_length / 2;
    let fft_len = (2 * win_length).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);
    let mut buffer = vec![Complex64::new(0.0, 0.0); fft_len];

    for t in 0..n_frames {
        buffer.iter_mut().for_each(|c| *c = Complex64::new(0.0, 0.0));
        for (k, w) in window.iter().enumerate() {
            // Frame t is centered at envelope index t
            let idx = (t + k) as isize - pad as isize;
            if idx >= 0 && (idx as usize) < n_frames {
                buffer[k].re = envelope[idx as usize] * w;
            }
        }

        forward.process(&mut buffer);
        for c in buffer.iter_mut() {
            *c = Complex64::new(c.norm_sqr(), 0.0);
        }
        inverse.process(&mut buffer);

        let zero_lag = buffer[0].re;
        for (lag, row) in tempogram.iter_mut().enumerate() {
            row[t] = if zero_lag > AMIN {
                buffer[lag].re / zero_lag
            } else {
                0.0
            };
        }
    }
    tempogram
}

fn hann(length: usize) -> Vec<f64> {
    (0..length)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / length as f64).cos())
        .collect()
}
