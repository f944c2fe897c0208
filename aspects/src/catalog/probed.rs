//! Aspects read from the external probe's sub-metric mapping

use crate::context::ContextKey;
use crate::registry::Registry;

/// Aspect name and the probe sub-metric backing it
pub const PROBED_ASPECTS: &[(&str, &str)] = &[
    ("Zero-crossings rate", "Zero_crossings_rate"),
    ("DC offset", "DC_offset"),
    ("Dynamic range", "Dynamic_range"),
    ("Signal entropy", "Entropy"),
    ("Duration-samples", "Number_of_samples"),
    ("Peak dB", "Peak_level"),
    ("RMS total", "RMS_level"),
    ("Crest factor", "Crest_factor"),
    ("RMS peak", "RMS_peak"),
    ("LUFS integrated", "I"),
    ("LUFS loudness range", "LRA"),
    ("LUFS low", "LRA.low"),
    ("LUFS high", "LRA.high"),
    ("Spectral mean", "mean"),
    ("Spectral variance", "variance"),
    ("Spectral centroid", "centroid"),
    ("Spectral spread", "spread"),
    ("Spectral skewness", "skewness"),
    ("Spectral kurtosis", "kurtosis"),
    ("Spectral entropy", "entropy"),
    ("Spectral flatness", "flatness"),
    ("Spectral crest", "crest"),
    ("Spectral flux", "flux"),
    ("Spectral slope", "slope"),
    ("Spectral decrease", "decrease"),
    ("Spectral rolloff", "rolloff"),
    ("Abs_Peak_count", "Abs_Peak_count"),
    ("Bit_depth", "Bit_depth"),
    ("Flat_factor", "Flat_factor"),
    ("Max_difference", "Max_difference"),
    ("Max_level", "Max_level"),
    ("Mean_difference", "Mean_difference"),
    ("Min_difference", "Min_difference"),
    ("Min_level", "Min_level"),
    ("Noise_floor", "Noise_floor"),
    ("Noise_floor_count", "Noise_floor_count"),
    ("Peak_count", "Peak_count"),
    ("RMS_difference", "RMS_difference"),
    ("RMS_trough", "RMS_trough"),
];

pub fn register(registry: &mut Registry) {
    for &(name, metric) in PROBED_ASPECTS {
        // A metric missing from the probe output reads as "not found"
        registry.register(name, &[ContextKey::ProbeMetrics], move |b| {
            Ok(b.probe_metrics()?.get(metric))
        });
    }
}
