//! Aspects computed from the shared spectrogram

use super::flatten;
use crate::context::{Bindings, ContextKey};
use crate::dsp::spectral as features;
use crate::error::Result;
use crate::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.register(
        "Chromagram",
        &[ContextKey::SpectrogramPower, ContextKey::SampleRate],
        chromagram,
    );
    registry.register(
        "Spectral Contrast",
        &[ContextKey::SpectrogramMagnitude, ContextKey::SampleRate],
        spectral_contrast,
    );
    registry.register(
        "Spectral Bandwidth",
        &[
            ContextKey::SpectrogramMagnitude,
            ContextKey::SampleRate,
            ContextKey::SpectralCentroid,
        ],
        spectral_bandwidth,
    );
    registry.register(
        "Spectral Centroid",
        &[ContextKey::SpectralCentroid],
        spectral_centroid,
    );
    registry.register(
        "Spectral Flatness",
        &[ContextKey::SpectrogramMagnitude],
        spectral_flatness,
    );
}

/// Chroma energy, `[channel][pitch class][frame]`
fn chromagram(b: &Bindings<'_>) -> Result<Vec<f64>> {
    let power = b.power()?;
    let freqs = power.params.bin_frequencies(b.sample_rate()?);
    Ok(flatten(power.channels.iter().map(|frames| {
        flatten(features::chromagram(frames, &freqs))
    })))
}

/// Octave-band contrast, `[channel][band][frame]`
fn spectral_contrast(b: &Bindings<'_>) -> Result<Vec<f64>> {
    let magnitude = b.magnitude()?;
    let freqs = magnitude.params.bin_frequencies(b.sample_rate()?);
    Ok(flatten(magnitude.channels.iter().map(|frames| {
        flatten(features::spectral_contrast(frames, &freqs))
    })))
}

fn spectral_bandwidth(b: &Bindings<'_>) -> Result<Vec<f64>> {
    let magnitude = b.magnitude()?;
    let freqs = magnitude.params.bin_frequencies(b.sample_rate()?);
    let centroid = b.spectral_centroid()?;
    Ok(flatten(
        magnitude
            .channels
            .iter()
            .zip(centroid)
            .map(|(frames, c)| features::spectral_bandwidth(frames, &freqs, c)),
    ))
}

fn spectral_centroid(b: &Bindings<'_>) -> Result<Vec<f64>> {
    Ok(flatten(b.spectral_centroid()?.iter().cloned()))
}

/// Flatness in dB per frame
fn spectral_flatness(b: &Bindings<'_>) -> Result<Vec<f64>> {
    Ok(flatten(
        b.magnitude()?
            .channels
            .iter()
            .map(|frames| features::spectral_flatness_db(frames)),
    ))
}
