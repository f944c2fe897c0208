//! Built-in aspect catalogue
//!
//! Each submodule registers one family of aspects. [`register_all`] is the
//! fixed list of registration functions run once at start-up.

pub mod probed;
pub mod spectral;
pub mod tensor;
pub mod waveform;

use crate::registry::Registry;

/// Register every built-in aspect
pub fn register_all(registry: &mut Registry) {
    probed::register(registry);
    waveform::register(registry);
    spectral::register(registry);
    tensor::register(registry);
}

/// Registry holding every built-in aspect
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    register_all(&mut registry);
    registry
}

/// Concatenate per-channel results channel-major
fn flatten<I, C>(channels: I) -> Vec<f64>
where
    I: IntoIterator<Item = C>,
    C: IntoIterator<Item = f64>,
{
    channels.into_iter().flatten().collect()
}
