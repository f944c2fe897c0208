//! Configuration for the aspects analyzer
//!
//! Loaded from TOML. Every field has a built-in default, so an absent file
//! or an empty one both yield a working configuration.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--aspects`, `--concurrency`, `--config`)
//! 2. `ASPECTS_CONFIG` environment variable (config file location)
//! 3. `<user config dir>/aspects/config.toml`
//! 4. Built-in defaults

use crate::audio::StftParams;
use crate::batch::ConcurrencyPolicy;
use crate::context::ContextSettings;
use crate::probe::{ffprobe::FFPROBE_COMMAND, DEFAULT_CACHE_CAPACITY};
use aspects_common::config::{load_or_default, CONFIG_ENV_VAR};
use aspects_common::Error;
use serde::Deserialize;
use std::path::Path;

/// Aspects requested when none are named on the command line
pub const DEFAULT_ASPECTS: &[&str] = &[
    "Abs_Peak_count",
    "Bit_depth",
    "Chromagram mean",
    "Crest factor",
    "DC offset",
    "Duration-samples",
    "Dynamic range",
    "Flat_factor",
    "LUFS high",
    "LUFS integrated",
    "LUFS loudness range",
    "LUFS low",
    "Max_difference",
    "Max_level",
    "Mean_difference",
    "Min_difference",
    "Min_level",
    "Noise_floor",
    "Noise_floor_count",
    "Peak dB",
    "Peak_count",
    "RMS mean",
    "RMS peak",
    "RMS total",
    "RMS_difference",
    "RMS_trough",
    "SRMR mean",
    "Signal entropy",
    "Spectral Bandwidth mean",
    "Spectral Centroid mean",
    "Spectral Contrast mean",
    "Spectral Flatness mean",
    "Spectral centroid",
    "Spectral crest",
    "Spectral decrease",
    "Spectral entropy",
    "Spectral flatness",
    "Spectral flux",
    "Spectral kurtosis",
    "Spectral mean",
    "Spectral rolloff",
    "Spectral skewness",
    "Spectral slope",
    "Spectral spread",
    "Spectral variance",
    "Tempo mean",
    "Tempogram mean",
    "Zero-crossing rate mean",
];

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AspectsConfig {
    /// Default aspect list
    #[serde(default = "default_aspects")]
    pub aspects: Vec<String>,

    /// Worker-pool policy for batch analysis
    #[serde(default)]
    pub concurrency: ConcurrencyPolicy,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub stft: StftParams,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AspectsConfig {
    fn default() -> Self {
        Self {
            aspects: default_aspects(),
            concurrency: ConcurrencyPolicy::default(),
            probe: ProbeConfig::default(),
            stft: StftParams::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AspectsConfig {
    /// Resolve and load configuration
    ///
    /// Falls back to defaults when neither the argument nor the environment
    /// names a file and the user config file does not exist. A named file
    /// that is missing or does not parse is an error.
    pub fn load(cli_path: Option<&Path>) -> aspects_common::Result<Self> {
        let config: Self = load_or_default(cli_path, CONFIG_ENV_VAR)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the analysis pipeline cannot run with
    pub fn validate(&self) -> aspects_common::Result<()> {
        if self.stft.n_fft < 2 {
            return Err(Error::InvalidInput(format!(
                "stft.n_fft must be at least 2, got {}",
                self.stft.n_fft
            )));
        }
        if self.stft.hop_length == 0 {
            return Err(Error::InvalidInput(
                "stft.hop_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-file context settings derived from this configuration
    pub fn context_settings(&self) -> ContextSettings {
        ContextSettings { stft: self.stft }
    }
}

/// External probe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Probe executable
    #[serde(default = "default_probe_command")]
    pub command: String,

    /// Maximum cached probe results
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            command: default_probe_command(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_aspects() -> Vec<String> {
    DEFAULT_ASPECTS.iter().map(|s| s.to_string()).collect()
}

fn default_probe_command() -> String {
    FFPROBE_COMMAND.to_string()
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AspectsConfig = toml::from_str("").unwrap();

        assert_eq!(config.aspects.len(), DEFAULT_ASPECTS.len());
        assert_eq!(config.concurrency, ConcurrencyPolicy::Auto);
        assert_eq!(config.probe.command, "ffprobe");
        assert_eq!(config.probe.cache_capacity, 256);
        assert_eq!(config.stft.n_fft, 2048);
        assert_eq!(config.stft.hop_length, 512);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_concurrency_forms() {
        let flag: AspectsConfig = toml::from_str("concurrency = true").unwrap();
        assert_eq!(flag.concurrency, ConcurrencyPolicy::Flag(true));

        let count: AspectsConfig = toml::from_str("concurrency = -2").unwrap();
        assert_eq!(count.concurrency, ConcurrencyPolicy::Count(-2));

        let fraction: AspectsConfig = toml::from_str("concurrency = 0.5").unwrap();
        assert_eq!(fraction.concurrency, ConcurrencyPolicy::Fraction(0.5));
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
            aspects = ["Peak dB", "RMS mean"]

            [probe]
            command = "/opt/ffmpeg/bin/ffprobe"

            [stft]
            n_fft = 1024
        "#;
        let config: AspectsConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.aspects, vec!["Peak dB", "RMS mean"]);
        assert_eq!(config.probe.command, "/opt/ffmpeg/bin/ffprobe");
        assert_eq!(config.probe.cache_capacity, 256);
        assert_eq!(config.stft.n_fft, 1024);
        assert_eq!(config.stft.hop_length, 512);
    }

    #[test]
    fn test_zero_hop_is_rejected() {
        let config: AspectsConfig = toml::from_str("[stft]\nhop_length = 0").unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = AspectsConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.context_settings().stft, StftParams::default());
    }
}
