//! Audio aspect analysis
//!
//! Measures named "aspects" of audio files: scalar or array measurements
//! such as peak level, loudness, spectral centroid or tempo.
//!
//! - [`registry`]: aspect name to compute function, with derived `"<name> mean"` aspects
//! - [`context`]: per-file intermediate values, bound to each aspect by declared key
//! - [`probe`]: bounded cache in front of the external multi-metric probe
//! - [`analyzer`]: evaluates requested aspects for one file
//! - [`batch`]: runs the analyzer over many files on a bounded worker pool
//! - [`catalog`]: built-in aspects

pub mod analyzer;
pub mod audio;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dsp;
pub mod error;
pub mod probe;
pub mod registry;
pub mod table;
pub mod types;

pub use analyzer::Analyzer;
pub use batch::{analyze_batch, analyze_batch_isolated, ConcurrencyPolicy, FileOutcome};
pub use config::AspectsConfig;
pub use context::{AnalysisContext, Bindings, ContextKey, ContextSettings};
pub use error::{AnalysisError, Result};
pub use probe::{ProbeCache, ProbeMetrics, Prober};
pub use registry::{AspectDescriptor, Registry};
pub use types::{AspectOutput, AspectValue, ResultRow, NOT_FOUND};
