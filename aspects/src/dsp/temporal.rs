//! Frame-wise time-domain features

/// Level reported for frames with no energy
pub const SILENCE_FLOOR_DB: f64 = -120.0;

/// Centered frames of `frame_length` samples advancing by `hop_length`
///
/// The signal is padded by half a frame on both sides, repeating the edge
/// sample when `edge` is set and with zeros otherwise.
fn centered_frames(
    signal: &[f32],
    frame_length: usize,
    hop_length: usize,
    edge: bool,
) -> Vec<Vec<f32>> {
    let pad = frame_length / 2;
    let (first, last) = match (signal.first(), signal.last()) {
        (Some(&f), Some(&l)) if edge => (f, l),
        _ => (0.0, 0.0),
    };

    let mut padded = Vec::with_capacity(signal.len() + 2 * pad);
    padded.resize(pad, first);
    padded.extend_from_slice(signal);
    padded.resize(padded.len() + pad, last);

    if padded.len() < frame_length {
        return Vec::new();
    }
    let count = 1 + (padded.len() - frame_length) / hop_length;
    (0..count)
        .map(|t| padded[t * hop_length..t * hop_length + frame_length].to_vec())
        .collect()
}

/// Frame RMS level in dB
pub fn frame_rms_db(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    centered_frames(signal, frame_length, hop_length, false)
        .iter()
        .map(|frame| {
            let mean_square =
                frame.iter().map(|&s| s as f64 * s as f64).sum::<f64>() / frame.len() as f64;
            let rms = mean_square.sqrt();
            if rms > 0.0 {
                20.0 * rms.log10()
            } else {
                SILENCE_FLOOR_DB
            }
        })
        .collect()
}

/// Fraction of sign changes within each frame (zero counts as positive)
pub fn zero_crossing_rate(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    centered_frames(signal, frame_length, hop_length, true)
        .iter()
        .map(|frame| {
            let crossings = frame
                .windows(2)
                .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
                .count();
            crossings as f64 / frame.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_constant_signal() {
        let signal = vec![0.5f32; 8192];
        let rms = frame_rms_db(&signal, 2048, 512);
        // Interior frames are full of 0.5
        assert!((rms[8] - 20.0 * 0.5f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_rms_of_silence_hits_floor() {
        let rms = frame_rms_db(&[0.0; 4096], 2048, 512);
        assert!(rms.iter().all(|&v| v == SILENCE_FLOOR_DB));
    }

    #[test]
    fn test_frame_count_matches_centered_layout() {
        let rms = frame_rms_db(&[0.1; 22050], 2048, 512);
        assert_eq!(rms.len(), 44);
    }

    #[test]
    fn test_zcr_of_alternating_signal() {
        let signal: Vec<f32> = (0..4096).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let zcr = zero_crossing_rate(&signal, 2048, 512);
        // 2047 sign changes in 2048 samples
        assert!((zcr[4] - 2047.0 / 2048.0).abs() < 1e-9);
    }

    #[test]
    fn test_zcr_of_dc_is_zero() {
        let zcr = zero_crossing_rate(&[0.3; 4096], 2048, 512);
        assert!(zcr.iter().all(|&v| v == 0.0));
    }
}
