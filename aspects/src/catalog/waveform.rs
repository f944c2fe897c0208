//! Aspects computed from the decoded waveform and the onset tempogram

use super::flatten;
use crate::context::{Bindings, ContextKey};
use crate::dsp::temporal;
use crate::error::Result;
use crate::registry::Registry;

/// Analysis frame length in samples
const FRAME_LENGTH: usize = 2048;
/// Frame advance in samples
const HOP_LENGTH: usize = 512;

pub fn register(registry: &mut Registry) {
    registry.register("RMS", &[ContextKey::Waveform], rms);
    registry.register("Zero-crossing rate", &[ContextKey::Waveform], zero_crossing_rate);
    registry.register("Tempogram", &[ContextKey::Tempogram], tempogram);
    registry.register("Tempo", &[ContextKey::Tempogram], tempo);
}

/// Frame RMS in dB, channel-major
fn rms(b: &Bindings<'_>) -> Result<Vec<f64>> {
    let waveform = b.waveform()?;
    Ok(flatten(waveform.channels.iter().map(|channel| {
        temporal::frame_rms_db(channel, FRAME_LENGTH, HOP_LENGTH)
    })))
}

/// Frame-wise zero-crossing rate, channel-major
///
/// Unlike "Zero-crossings rate" this is computed in-process per frame.
fn zero_crossing_rate(b: &Bindings<'_>) -> Result<Vec<f64>> {
    let waveform = b.waveform()?;
    Ok(flatten(waveform.channels.iter().map(|channel| {
        temporal::zero_crossing_rate(channel, FRAME_LENGTH, HOP_LENGTH)
    })))
}

fn tempogram(b: &Bindings<'_>) -> Result<Vec<f64>> {
    Ok(b.tempogram()?.flatten())
}

/// Per-channel tempo in BPM
fn tempo(b: &Bindings<'_>) -> Result<Vec<f64>> {
    Ok(b.tempogram()?.estimate_tempo())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Waveform;
    use crate::context::{AnalysisContext, ContextSettings};
    use crate::types::AspectValue;
    use std::path::Path;

    fn context() -> AnalysisContext {
        let sample_rate = 8000u32;
        let tone: Vec<f32> = (0..sample_rate * 2)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (0.5 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as f32
            })
            .collect();
        AnalysisContext::from_waveform(
            Path::new("/virtual/tone.wav"),
            Waveform::new(vec![tone.clone(), tone]),
            sample_rate,
            &ContextSettings::default(),
            None,
        )
    }

    fn evaluate(registry: &Registry, ctx: &AnalysisContext, name: &str) -> AspectValue {
        let descriptor = registry.resolve(name).unwrap();
        let bindings = ctx.bind(name, descriptor.requires()).unwrap();
        descriptor.compute(&bindings).unwrap()
    }

    #[test]
    fn test_registers_arrays_with_means() {
        let mut registry = Registry::new();
        register(&mut registry);
        assert_eq!(
            registry.names(),
            vec![
                "RMS",
                "RMS mean",
                "Tempo",
                "Tempo mean",
                "Tempogram",
                "Tempogram mean",
                "Zero-crossing rate",
                "Zero-crossing rate mean",
            ]
        );
    }

    #[test]
    fn test_rms_covers_both_channels() {
        let mut registry = Registry::new();
        register(&mut registry);
        let ctx = context();

        let rms = evaluate(&registry, &ctx, "RMS");
        let values = rms.as_array().unwrap();
        // 16000 samples, centered frames: 1 + 16000 / 512 = 32 per channel
        assert_eq!(values.len(), 64);

        // Interior frames of a 0.5 sine sit near -9 dB
        let mean = evaluate(&registry, &ctx, "RMS mean").as_number().unwrap();
        assert!(mean < -8.0 && mean > -11.0, "mean {}", mean);
    }

    #[test]
    fn test_tempo_per_channel() {
        let mut registry = Registry::new();
        register(&mut registry);
        let ctx = context();

        let tempo = evaluate(&registry, &ctx, "Tempo");
        assert_eq!(tempo.as_array().unwrap().len(), 2);
    }
}
