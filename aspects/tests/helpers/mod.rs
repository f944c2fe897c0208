//! Test Helper Utilities
//!
//! Shared utilities for testing aspects

#![allow(dead_code)]

pub mod audio_generator;
pub mod scripted_prober;

// Re-export commonly used items
pub use audio_generator::{generate_sine_wav, generate_test_library, AudioConfig};
pub use scripted_prober::ScriptedProber;

use aspects::{catalog, Analyzer, ContextSettings, ProbeCache, Registry};
use std::sync::Arc;

/// Probe metrics matching a 5 second, 44.1 kHz sine at half scale
pub const SINE_METRICS: &[(&str, f64)] = &[
    ("Number_of_samples", 220500.0),
    ("Peak_level", -6.0206),
    ("RMS_level", -9.0309),
    ("I", -9.1),
];

/// Analyzer over `registry` with a scripted probe in front of the cache
pub fn analyzer_with(registry: Registry, prober: &ScriptedProber) -> Analyzer {
    let cache = ProbeCache::new(Box::new(prober.clone()), 16);
    Analyzer::new(Arc::new(registry), Arc::new(cache), ContextSettings::default())
}

/// Built-in catalogue with a scripted probe
pub fn default_analyzer(prober: &ScriptedProber) -> Analyzer {
    analyzer_with(catalog::default_registry(), prober)
}
