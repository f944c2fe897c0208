//! Aspects computed from the contiguous audio tensor

use crate::context::{Bindings, ContextKey};
use crate::dsp::reverb;
use crate::error::Result;
use crate::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.register(
        "SRMR",
        &[ContextKey::AudioTensor, ContextKey::SampleRate, ContextKey::CpuOnly],
        srmr,
    );
}

/// Per-channel modulation energy ratio; fast mode without acceleration
fn srmr(b: &Bindings<'_>) -> Result<Vec<f64>> {
    Ok(reverb::modulation_energy_ratio(
        b.tensor()?,
        b.sample_rate()?,
        b.cpu_only()?,
    ))
}
