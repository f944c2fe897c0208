//! Single-File Analyzer
//!
//! Builds one [`AnalysisContext`] per file and evaluates the requested
//! aspects against it in request order. Unknown names yield the
//! [`AspectValue::NotFound`] sentinel; every other failure aborts the file.

use crate::catalog;
use crate::config::AspectsConfig;
use crate::context::{AnalysisContext, ContextSettings};
use crate::error::Result;
use crate::probe::ProbeCache;
use crate::registry::Registry;
use crate::types::AspectValue;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Evaluates aspects for one file at a time
///
/// Cloning is cheap: the registry and probe cache are shared.
#[derive(Clone)]
pub struct Analyzer {
    registry: Arc<Registry>,
    probe_cache: Arc<ProbeCache>,
    settings: ContextSettings,
}

impl Analyzer {
    pub fn new(registry: Arc<Registry>, probe_cache: Arc<ProbeCache>, settings: ContextSettings) -> Self {
        Self {
            registry,
            probe_cache,
            settings,
        }
    }

    /// Analyzer with the built-in catalogue and an ffprobe-backed cache
    pub fn from_config(config: &AspectsConfig) -> Self {
        let probe_cache = ProbeCache::ffprobe(&config.probe.command, config.probe.cache_capacity);
        Self::new(
            Arc::new(catalog::default_registry()),
            Arc::new(probe_cache),
            config.context_settings(),
        )
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn probe_cache(&self) -> &Arc<ProbeCache> {
        &self.probe_cache
    }

    /// Every registered aspect name, sorted
    pub fn list_available_aspects(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Evaluate `aspects` for the file at `path`
    ///
    /// The result has one value per requested name, in request order;
    /// duplicates are evaluated and reported again. The file is checked and
    /// decoded even when no aspects are requested.
    pub fn analyze_file<S: AsRef<str>>(&self, path: &Path, aspects: &[S]) -> Result<Vec<AspectValue>> {
        let ctx = AnalysisContext::build(path, &self.settings, Some(Arc::clone(&self.probe_cache)))?;

        let mut values = Vec::with_capacity(aspects.len());
        for name in aspects {
            let name = name.as_ref();
            let Some(descriptor) = self.registry.resolve(name) else {
                debug!(path = %ctx.path().display(), aspect = name, "Aspect not registered");
                values.push(AspectValue::NotFound);
                continue;
            };

            let bindings = ctx.bind(name, descriptor.requires())?;
            values.push(descriptor.compute(&bindings)?);
        }

        debug!(
            path = %ctx.path().display(),
            aspect_count = values.len(),
            "File analyzed"
        );

        Ok(values)
    }
}
