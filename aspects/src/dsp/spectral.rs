//! Spectral features computed frame by frame from a magnitude or power spectrogram
//!
//! Every function takes the frames of one channel (`[frame][bin]`) and returns
//! one value per frame, or one row per band (`[band][frame]`).

/// Floor applied before taking logarithms
const AMIN: f64 = 1e-10;

/// Lower edge of the first spectral-contrast octave band, in Hz
const CONTRAST_FMIN: f64 = 200.0;

/// Number of octave bands above `CONTRAST_FMIN` (plus one band below it)
const CONTRAST_BANDS: usize = 6;

/// Fraction of each band used for peak and valley estimates
const CONTRAST_QUANTILE: f64 = 0.02;

/// Magnitude-weighted mean frequency of each frame
///
/// Frames without energy report 0.
pub fn spectral_centroid(frames: &[Vec<f32>], freqs: &[f64]) -> Vec<f64> {
    frames
        .iter()
        .map(|frame| {
            let total: f64 = frame.iter().map(|&m| m as f64).sum();
            if total <= 0.0 {
                return 0.0;
            }
            frame
                .iter()
                .zip(freqs)
                .map(|(&m, &f)| m as f64 * f)
                .sum::<f64>()
                / total
        })
        .collect()
}

/// Second-order spectral bandwidth around a precomputed centroid
pub fn spectral_bandwidth(frames: &[Vec<f32>], freqs: &[f64], centroid: &[f64]) -> Vec<f64> {
    frames
        .iter()
        .zip(centroid)
        .map(|(frame, &c)| {
            let total: f64 = frame.iter().map(|&m| m as f64).sum();
            if total <= 0.0 {
                return 0.0;
            }
            let spread: f64 = frame
                .iter()
                .zip(freqs)
                .map(|(&m, &f)| (m as f64 / total) * (f - c).powi(2))
                .sum();
            spread.sqrt()
        })
        .collect()
}

/// Spectral flatness in dB: geometric over arithmetic mean of frame power
pub fn spectral_flatness_db(frames: &[Vec<f32>]) -> Vec<f64> {
    frames
        .iter()
        .map(|frame| {
            if frame.is_empty() {
                return 0.0;
            }
            let power: Vec<f64> = frame
                .iter()
                .map(|&m| (m as f64 * m as f64).max(AMIN))
                .collect();
            let n = power.len() as f64;
            let log_mean = power.iter().map(|p| p.ln()).sum::<f64>() / n;
            let arith_mean = power.iter().sum::<f64>() / n;
            let flatness = log_mean.exp() / arith_mean;
            if flatness > 0.0 {
                10.0 * flatness.log10()
            } else {
                0.0
            }
        })
        .collect()
}

/// Octave-band spectral contrast in dB, `[band][frame]`
///
/// Bands are `[0, 200)`, then octaves from 200 Hz, the last one running to
/// Nyquist. Peak and valley are the means of the top and bottom 2% of each
/// band's magnitudes.
pub fn spectral_contrast(frames: &[Vec<f32>], freqs: &[f64]) -> Vec<Vec<f64>> {
    let mut edges = vec![0.0];
    edges.extend((0..CONTRAST_BANDS).map(|k| CONTRAST_FMIN * 2f64.powi(k as i32)));
    edges.push(f64::INFINITY);

    let bands: Vec<Vec<usize>> = edges
        .windows(2)
        .map(|edge| {
            freqs
                .iter()
                .enumerate()
                .filter(|(_, &f)| f >= edge[0] && f < edge[1])
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    bands
        .iter()
        .map(|bins| {
            frames
                .iter()
                .map(|frame| band_contrast(frame, bins))
                .collect()
        })
        .collect()
}

fn band_contrast(frame: &[f32], bins: &[usize]) -> f64 {
    let mut values: Vec<f64> = bins
        .iter()
        .filter_map(|&i| frame.get(i))
        .map(|&m| m as f64)
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);

    let take = ((values.len() as f64 * CONTRAST_QUANTILE).round() as usize).max(1);
    let valley = values[..take].iter().sum::<f64>() / take as f64;
    let peak = values[values.len() - take..].iter().sum::<f64>() / take as f64;

    power_to_db(peak) - power_to_db(valley)
}

fn power_to_db(value: f64) -> f64 {
    10.0 * value.max(AMIN).log10()
}

/// Twelve-bin chroma, `[pitch class][frame]`, C = 0
///
/// Each bin's power is added to the pitch class nearest its center
/// frequency; each frame is then scaled so its largest class is 1.
pub fn chromagram(power_frames: &[Vec<f32>], freqs: &[f64]) -> Vec<Vec<f64>> {
    let classes: Vec<Option<usize>> = freqs
        .iter()
        .map(|&f| {
            if f <= 0.0 {
                return None;
            }
            // MIDI note number, A4 = 69
            let midi = 69.0 + 12.0 * (f / 440.0).log2();
            Some((midi.round() as i64).rem_euclid(12) as usize)
        })
        .collect();

    let mut chroma = vec![Vec::with_capacity(power_frames.len()); 12];
    for frame in power_frames {
        let mut energy = [0.0f64; 12];
        for (&p, class) in frame.iter().zip(&classes) {
            if let Some(c) = class {
                energy[*c] += p as f64;
            }
        }
        let max = energy.iter().cloned().fold(0.0, f64::max);
        for (row, &e) in chroma.iter_mut().zip(&energy) {
            row.push(if max > 0.0 { e / max } else { 0.0 });
        }
    }
    chroma
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|k| k as f64 * step).collect()
    }

    #[test]
    fn test_centroid_of_single_bin() {
        let f = freqs(5, 100.0);
        let frames = vec![vec![0.0, 0.0, 1.0, 0.0, 0.0]];
        assert_eq!(spectral_centroid(&frames, &f), vec![200.0]);
    }

    #[test]
    fn test_centroid_of_silence_is_zero() {
        let f = freqs(3, 100.0);
        assert_eq!(spectral_centroid(&[vec![0.0; 3]], &f), vec![0.0]);
    }

    #[test]
    fn test_bandwidth_of_symmetric_pair() {
        let f = freqs(5, 100.0);
        let frames = vec![vec![0.0, 1.0, 0.0, 1.0, 0.0]];
        let centroid = spectral_centroid(&frames, &f);
        let bandwidth = spectral_bandwidth(&frames, &f, &centroid);
        assert!((bandwidth[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_flatness_of_white_spectrum_is_zero_db() {
        let frames = vec![vec![0.5f32; 64]];
        let flatness = spectral_flatness_db(&frames);
        assert!(flatness[0].abs() < 1e-6);
    }

    #[test]
    fn test_flatness_of_peaky_spectrum_is_negative() {
        let mut frame = vec![0.0f32; 64];
        frame[10] = 1.0;
        let flatness = spectral_flatness_db(&[frame]);
        assert!(flatness[0] < -20.0);
    }

    #[test]
    fn test_contrast_shape() {
        let f = freqs(1025, 22050.0 / 2048.0);
        let frames = vec![vec![1.0f32; 1025]; 3];
        let contrast = spectral_contrast(&frames, &f);
        assert_eq!(contrast.len(), 7);
        assert!(contrast.iter().all(|band| band.len() == 3));
        // Flat spectrum has no contrast
        assert!(contrast[3][0].abs() < 1e-9);
    }

    #[test]
    fn test_chroma_picks_a_for_440() {
        let f = vec![0.0, 261.63, 440.0];
        let frames = vec![vec![5.0f32, 1.0, 4.0]];
        let chroma = chromagram(&frames, &f);

        assert_eq!(chroma.len(), 12);
        assert_eq!(chroma[9][0], 1.0);
        assert_eq!(chroma[0][0], 0.25);
    }
}
