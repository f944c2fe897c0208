//! Context Resolver
//!
//! Builds the per-file [`AnalysisContext`]: the bag of named intermediate
//! values aspect functions draw their inputs from. Decoding, the spectrogram
//! and its magnitude/power, and the CPU-only flag are computed eagerly when
//! the context is built. The audio tensor, spectral centroid, tempogram and
//! probe metrics are computed on first use and then reused for the rest of
//! the file.
//!
//! Aspects never see the context directly. They receive [`Bindings`], a view
//! restricted to the [`ContextKey`]s the aspect declared at registration.

use crate::audio::{decode_audio_file, AudioTensor, SpectralMatrix, Spectrogram, StftParams, Waveform};
use crate::dsp::{spectral, tempo::Tempogram};
use crate::error::{AnalysisError, Result};
use crate::probe::{cache_key, ProbeCache, ProbeMetrics};
use once_cell::unsync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable marking parallel acceleration hardware as available
pub const ACCELERATOR_ENV_VAR: &str = "ASPECTS_ACCELERATOR";

/// Named context value an aspect can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKey {
    /// Absolute path of the analyzed file
    Path,
    /// Decoded samples, channel-major
    Waveform,
    /// Sample rate in Hz
    SampleRate,
    /// Complex STFT
    Spectrogram,
    /// STFT magnitude
    SpectrogramMagnitude,
    /// STFT power
    SpectrogramPower,
    /// True when no acceleration hardware is available
    CpuOnly,
    /// Contiguous `[channels, frames]` copy of the waveform (lazy)
    AudioTensor,
    /// Per-frame spectral centroid (lazy)
    SpectralCentroid,
    /// Autocorrelation tempogram (lazy)
    Tempogram,
    /// External probe metrics, via the probe cache (lazy)
    ProbeMetrics,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Settings shared by every context built by one analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSettings {
    pub stft: StftParams,
}

/// Per-file analysis context
pub struct AnalysisContext {
    path: PathBuf,
    waveform: Waveform,
    sample_rate: u32,
    spectrogram: Spectrogram,
    magnitude: SpectralMatrix,
    power: SpectralMatrix,
    cpu_only: bool,
    probe_cache: Option<Arc<ProbeCache>>,
    tensor: OnceCell<AudioTensor>,
    centroid: OnceCell<Vec<Vec<f64>>>,
    tempogram: OnceCell<Tempogram>,
}

impl AnalysisContext {
    /// Build the context for one file
    ///
    /// Fails with [`AnalysisError::NotFound`] when the file does not exist and
    /// with [`AnalysisError::Decode`] when it cannot be decoded.
    pub fn build(
        path: &Path,
        settings: &ContextSettings,
        probe_cache: Option<Arc<ProbeCache>>,
    ) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::NotFound(path.to_path_buf()));
        }

        let decoded = decode_audio_file(path)?;
        Ok(Self::from_waveform(
            path,
            decoded.waveform,
            decoded.sample_rate,
            settings,
            probe_cache,
        ))
    }

    /// Build a context around an already decoded waveform
    pub fn from_waveform(
        path: &Path,
        waveform: Waveform,
        sample_rate: u32,
        settings: &ContextSettings,
        probe_cache: Option<Arc<ProbeCache>>,
    ) -> Self {
        let spectrogram = Spectrogram::compute(&waveform, settings.stft);
        let magnitude = spectrogram.magnitude();
        let power = spectrogram.power();

        Self {
            path: cache_key(path),
            waveform,
            sample_rate,
            spectrogram,
            magnitude,
            power,
            cpu_only: !accelerator_available(),
            probe_cache,
            tensor: OnceCell::new(),
            centroid: OnceCell::new(),
            tempogram: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this context can supply `key`
    pub fn provides(&self, key: ContextKey) -> bool {
        match key {
            ContextKey::ProbeMetrics => self.probe_cache.is_some(),
            _ => true,
        }
    }

    /// Restrict the context to `declared` keys for one aspect
    ///
    /// Fails fast with [`AnalysisError::ContractViolation`] when a declared
    /// key cannot be supplied.
    pub fn bind<'a>(&'a self, aspect: &'a str, declared: &'a [ContextKey]) -> Result<Bindings<'a>> {
        if let Some(&key) = declared.iter().find(|&&key| !self.provides(key)) {
            return Err(AnalysisError::ContractViolation {
                aspect: aspect.to_string(),
                key,
            });
        }
        Ok(Bindings {
            ctx: self,
            aspect,
            declared,
        })
    }

    fn tensor(&self) -> &AudioTensor {
        self.tensor.get_or_init(|| self.waveform.to_tensor())
    }

    fn centroid(&self) -> &Vec<Vec<f64>> {
        self.centroid.get_or_init(|| {
            let freqs = self.magnitude.params.bin_frequencies(self.sample_rate);
            self.magnitude
                .channels
                .iter()
                .map(|frames| spectral::spectral_centroid(frames, &freqs))
                .collect()
        })
    }

    fn tempogram(&self) -> &Tempogram {
        self.tempogram
            .get_or_init(|| Tempogram::compute(&self.power, self.sample_rate))
    }

    fn probe_metrics(&self) -> Option<Result<Arc<ProbeMetrics>>> {
        self.probe_cache
            .as_ref()
            .map(|cache| cache.get_or_compute(&self.path))
    }
}

/// Whether parallel acceleration hardware is available to this process
///
/// Reads [`ACCELERATOR_ENV_VAR`]; `1`, `true` and `yes` count as available.
pub fn accelerator_available() -> bool {
    std::env::var(ACCELERATOR_ENV_VAR)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Context view restricted to one aspect's declared keys
pub struct Bindings<'a> {
    ctx: &'a AnalysisContext,
    aspect: &'a str,
    declared: &'a [ContextKey],
}

impl<'a> Bindings<'a> {
    pub fn aspect(&self) -> &str {
        self.aspect
    }

    fn require(&self, key: ContextKey) -> Result<()> {
        if self.declared.contains(&key) {
            Ok(())
        } else {
            Err(AnalysisError::ContractViolation {
                aspect: self.aspect.to_string(),
                key,
            })
        }
    }

    pub fn path(&self) -> Result<&'a Path> {
        self.require(ContextKey::Path)?;
        Ok(&self.ctx.path)
    }

    pub fn waveform(&self) -> Result<&'a Waveform> {
        self.require(ContextKey::Waveform)?;
        Ok(&self.ctx.waveform)
    }

    pub fn sample_rate(&self) -> Result<u32> {
        self.require(ContextKey::SampleRate)?;
        Ok(self.ctx.sample_rate)
    }

    pub fn spectrogram(&self) -> Result<&'a Spectrogram> {
        self.require(ContextKey::Spectrogram)?;
        Ok(&self.ctx.spectrogram)
    }

    pub fn magnitude(&self) -> Result<&'a SpectralMatrix> {
        self.require(ContextKey::SpectrogramMagnitude)?;
        Ok(&self.ctx.magnitude)
    }

    pub fn power(&self) -> Result<&'a SpectralMatrix> {
        self.require(ContextKey::SpectrogramPower)?;
        Ok(&self.ctx.power)
    }

    pub fn cpu_only(&self) -> Result<bool> {
        self.require(ContextKey::CpuOnly)?;
        Ok(self.ctx.cpu_only)
    }

    pub fn tensor(&self) -> Result<&'a AudioTensor> {
        self.require(ContextKey::AudioTensor)?;
        Ok(self.ctx.tensor())
    }

    /// Spectral centroid, `[channel][frame]`
    pub fn spectral_centroid(&self) -> Result<&'a Vec<Vec<f64>>> {
        self.require(ContextKey::SpectralCentroid)?;
        Ok(self.ctx.centroid())
    }

    pub fn tempogram(&self) -> Result<&'a Tempogram> {
        self.require(ContextKey::Tempogram)?;
        Ok(self.ctx.tempogram())
    }

    pub fn probe_metrics(&self) -> Result<Arc<ProbeMetrics>> {
        self.require(ContextKey::ProbeMetrics)?;
        self.ctx
            .probe_metrics()
            .unwrap_or_else(|| {
                Err(AnalysisError::ContractViolation {
                    aspect: self.aspect.to_string(),
                    key: ContextKey::ProbeMetrics,
                })
            })
    }
}
