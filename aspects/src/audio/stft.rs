//! Short-time Fourier transform
//!
//! Centered, zero-padded frames with a periodic Hann window. Only the
//! non-negative frequency bins (`n_fft / 2 + 1`) are kept.

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;
use serde::Deserialize;

use super::decoder::Waveform;

/// STFT parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StftParams {
    /// FFT window length in samples
    pub n_fft: usize,
    /// Frame advance in samples
    pub hop_length: usize,
}

impl Default for StftParams {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
        }
    }
}

impl StftParams {
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Center frequency of each bin in Hz
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f64> {
        let step = sample_rate as f64 / self.n_fft as f64;
        (0..self.n_bins()).map(|k| k as f64 * step).collect()
    }

    /// Frames per second produced by this hop length
    pub fn frame_rate(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.hop_length as f64
    }
}

/// Complex spectrogram, indexed `[channel][frame][bin]`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub params: StftParams,
    pub channels: Vec<Vec<Vec<Complex32>>>,
}

/// Real-valued spectral matrix, indexed `[channel][frame][bin]`
#[derive(Debug, Clone)]
pub struct SpectralMatrix {
    pub params: StftParams,
    pub channels: Vec<Vec<Vec<f32>>>,
}

impl Spectrogram {
    /// Compute the spectrogram of every channel
    pub fn compute(waveform: &Waveform, params: StftParams) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(params.n_fft);
        let window = hann_window(params.n_fft);

        let channels = waveform
            .channels
            .iter()
            .map(|signal| stft_channel(signal, params, &window, fft.as_ref()))
            .collect();

        Self { params, channels }
    }

    /// Pointwise magnitude
    pub fn magnitude(&self) -> SpectralMatrix {
        self.map(|c| c.norm())
    }

    /// Pointwise power (squared magnitude)
    pub fn power(&self) -> SpectralMatrix {
        self.map(|c| c.norm_sqr())
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    fn map(&self, f: impl Fn(&Complex32) -> f32) -> SpectralMatrix {
        let channels = self
            .channels
            .iter()
            .map(|frames| {
                frames
                    .iter()
                    .map(|frame| frame.iter().map(&f).collect())
                    .collect()
            })
            .collect();
        SpectralMatrix {
            params: self.params,
            channels,
        }
    }
}

fn stft_channel(
    signal: &[f32],
    params: StftParams,
    window: &[f32],
    fft: &dyn rustfft::Fft<f32>,
) -> Vec<Vec<Complex32>> {
    let n_fft = params.n_fft;
    let pad = n_fft / 2;

    let mut padded = vec![0.0f32; signal.len() + 2 * pad];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let n_frames = 1 + (padded.len() - n_fft) / params.hop_length;
    let mut frames = Vec::with_capacity(n_frames);
    let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];

    for t in 0..n_frames {
        let start = t * params.hop_length;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex32::new(padded[start + i] * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..params.n_bins()].to_vec());
    }

    frames
}

/// Periodic Hann window
pub fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|n| {
            let phase = 2.0 * std::f32::consts::PI * n as f32 / length as f32;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}
