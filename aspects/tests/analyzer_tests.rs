//! Single-file analyzer tests against generated WAV fixtures

mod helpers;

use aspects::probe::cache_key;
use aspects::{catalog, AnalysisError, AspectValue, ContextKey, Registry};
use helpers::{analyzer_with, default_analyzer, generate_sine_wav, AudioConfig, ScriptedProber, SINE_METRICS};
use std::path::PathBuf;
use tempfile::TempDir;

fn sine_fixture(dir: &TempDir) -> PathBuf {
    generate_sine_wav(&dir.path().join("testSine2ch5sec.wav"), &AudioConfig::default()).unwrap()
}

/// Built-in catalogue plus an aspect reporting whether the file is stereo
fn registry_with_stereo() -> Registry {
    let mut registry = catalog::default_registry();
    registry.register("stereo", &[ContextKey::Waveform], |b| {
        Ok(b.waveform()?.channel_count() == 2)
    });
    registry
}

#[test]
fn test_values_follow_request_order() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let prober = ScriptedProber::new(SINE_METRICS);
    let analyzer = default_analyzer(&prober);

    let values = analyzer
        .analyze_file(&path, &["Duration-samples", "Peak dB", "invalidAspect"])
        .unwrap();

    assert_eq!(
        values,
        vec![
            AspectValue::Number(220500.0),
            AspectValue::Number(-6.0206),
            AspectValue::NotFound,
        ]
    );
}

#[test]
fn test_unknown_aspect_is_sentinel() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let analyzer = default_analyzer(&ScriptedProber::default());

    let values = analyzer.analyze_file(&path, &["invalidAspect"]).unwrap();
    assert_eq!(values, vec![AspectValue::NotFound]);
    assert_eq!(values[0].to_string(), "not found");
}

#[test]
fn test_missing_probe_metric_is_sentinel() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let analyzer = default_analyzer(&ScriptedProber::new(SINE_METRICS));

    let values = analyzer.analyze_file(&path, &["Noise_floor", "RMS total"]).unwrap();
    assert_eq!(values, vec![AspectValue::NotFound, AspectValue::Number(-9.0309)]);
}

#[test]
fn test_custom_registration_is_evaluated() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let analyzer = analyzer_with(registry_with_stereo(), &ScriptedProber::default());

    let values = analyzer.analyze_file(&path, &["stereo"]).unwrap();
    assert_eq!(values, vec![AspectValue::Number(1.0)]);
    assert!(analyzer.list_available_aspects().contains(&"stereo".to_string()));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let analyzer = default_analyzer(&ScriptedProber::default());

    let result = analyzer.analyze_file(&dir.path().join("nonExistentFile.wav"), &[""]);
    assert!(matches!(result, Err(AnalysisError::NotFound(_))));
}

#[test]
fn test_undecodable_file_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();
    let analyzer = default_analyzer(&ScriptedProber::default());

    let result = analyzer.analyze_file(&path, &["RMS mean"]);
    assert!(matches!(result, Err(AnalysisError::Decode(_))));
}

#[test]
fn test_duplicate_requests_repeat_values() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let prober = ScriptedProber::new(SINE_METRICS);
    let analyzer = default_analyzer(&prober);

    let values = analyzer
        .analyze_file(&path, &["Peak dB", "RMS mean", "Peak dB", "RMS mean"])
        .unwrap();

    assert_eq!(values.len(), 4);
    assert_eq!(values[0], values[2]);
    assert_eq!(values[1], values[3]);
    // One probe backs every probe-derived aspect of the file
    assert_eq!(prober.calls(), 1);
}

#[test]
fn test_relative_path_uses_absolute_cache_key() {
    let dir = TempDir::new_in(".").unwrap();
    let dir_name = dir.path().file_name().unwrap();
    let path = PathBuf::from(dir_name).join("relative.wav");
    generate_sine_wav(&path, &AudioConfig::default()).unwrap();
    let prober = ScriptedProber::new(SINE_METRICS);
    let analyzer = default_analyzer(&prober);

    analyzer.analyze_file(&path, &["Peak dB"]).unwrap();

    let probed = prober.probed_paths();
    assert_eq!(probed, vec![cache_key(&path)]);
    assert!(probed[0].is_absolute());
    assert!(analyzer.probe_cache().contains(&path));
}

#[test]
fn test_zero_aspects_yield_empty_row() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let analyzer = default_analyzer(&ScriptedProber::default());

    let none: [&str; 0] = [];
    assert!(analyzer.analyze_file(&path, &none).unwrap().is_empty());
}

#[test]
fn test_derived_mean_matches_array() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let analyzer = default_analyzer(&ScriptedProber::default());

    for name in ["RMS", "Spectral Centroid", "Zero-crossing rate"] {
        let mean_name = format!("{} mean", name);
        let values = analyzer.analyze_file(&path, &[name, mean_name.as_str()]).unwrap();

        let array = values[0].as_array().unwrap();
        let expected = array.iter().sum::<f64>() / array.len() as f64;
        let mean = values[1].as_number().unwrap();
        assert!(
            (mean - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "{}: {} != {}",
            mean_name,
            mean,
            expected
        );
    }
}

#[test]
fn test_waveform_aspects_on_sine() {
    let dir = TempDir::new().unwrap();
    let path = sine_fixture(&dir);
    let analyzer = default_analyzer(&ScriptedProber::default());

    let values = analyzer
        .analyze_file(&path, &["Spectral Centroid mean", "Zero-crossing rate mean", "SRMR"])
        .unwrap();

    let centroid = values[0].as_number().unwrap();
    assert!((centroid - 440.0).abs() < 60.0, "centroid {}", centroid);

    // 440 Hz crosses zero 880 times per second
    let zcr = values[1].as_number().unwrap();
    assert!((zcr - 880.0 / 44100.0).abs() < 0.002, "zcr {}", zcr);

    assert_eq!(values[2].as_array().unwrap().len(), 2);
}
