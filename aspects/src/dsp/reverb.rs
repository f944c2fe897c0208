//! Speech-to-reverberation modulation energy ratio
//!
//! The temporal envelope of each channel is band-split into log-spaced
//! modulation bands between 4 and 128 Hz. Reverberation fills in the slow
//! modulation dips, shifting energy toward the upper bands, so the ratio of
//! the lower to the upper half of the bands drops as reverberation grows.

use crate::audio::AudioTensor;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

const MOD_FMIN: f64 = 4.0;
const MOD_FMAX: f64 = 128.0;
const MOD_BANDS: usize = 8;

/// Envelope rate in precise mode, Hz
const PRECISE_ENVELOPE_RATE: u32 = 512;
/// Envelope rate in fast mode, Hz
const FAST_ENVELOPE_RATE: u32 = 256;

/// Modulation band edges in Hz, `MOD_BANDS + 1` values
pub fn modulation_band_edges() -> Vec<f64> {
    let ratio = MOD_FMAX / MOD_FMIN;
    (0..=MOD_BANDS)
        .map(|k| MOD_FMIN * ratio.powf(k as f64 / MOD_BANDS as f64))
        .collect()
}

/// Per-channel modulation energy ratio
///
/// `fast` halves the envelope rate, trading resolution of the top band for
/// speed. Channels with no upper-band energy report 0.
pub fn modulation_energy_ratio(tensor: &AudioTensor, sample_rate: u32, fast: bool) -> Vec<f64> {
    let envelope_rate = if fast {
        FAST_ENVELOPE_RATE
    } else {
        PRECISE_ENVELOPE_RATE
    };
    let mut planner = FftPlanner::<f64>::new();

    tensor
        .rows()
        .map(|row| {
            let (envelope, rate) = envelope(row, sample_rate, envelope_rate);
            let energies = band_energies(&envelope, rate, &mut planner);
            let (low, high) = energies.split_at(MOD_BANDS / 2);
            let high: f64 = high.iter().sum();
            if high > 0.0 {
                low.iter().sum::<f64>() / high
            } else {
                0.0
            }
        })
        .collect()
}

/// Rectified envelope averaged over blocks of `sample_rate / envelope_rate`
///
/// Returns the envelope and its actual rate in Hz.
fn envelope(signal: &[f32], sample_rate: u32, envelope_rate: u32) -> (Vec<f64>, f64) {
    let block = (sample_rate / envelope_rate).max(1) as usize;
    let envelope = signal
        .chunks(block)
        .map(|chunk| chunk.iter().map(|s| s.abs() as f64).sum::<f64>() / chunk.len() as f64)
        .collect();
    (envelope, sample_rate as f64 / block as f64)
}

fn band_energies(envelope: &[f64], rate: f64, planner: &mut FftPlanner<f64>) -> Vec<f64> {
    let mut energies = vec![0.0; MOD_BANDS];
    if envelope.len() < 2 {
        return energies;
    }

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    let n = envelope.len();
    let mut buffer: Vec<Complex64> = envelope
        .iter()
        .map(|&e| Complex64::new(e - mean, 0.0))
        .collect();
    planner.plan_fft_forward(n).process(&mut buffer);

    let edges = modulation_band_edges();
    let resolution = rate / n as f64;
    for (k, bin) in buffer.iter().enumerate().take(n / 2 + 1).skip(1) {
        let freq = k as f64 * resolution;
        if let Some(band) = edges
            .windows(2)
            .position(|edge| freq >= edge[0] && freq < edge[1])
        {
            energies[band] += bin.norm_sqr();
        }
    }
    energies
}
