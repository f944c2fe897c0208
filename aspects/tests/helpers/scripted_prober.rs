//! In-process stand-in for the external probe

use aspects::probe::{ProbeMetrics, Prober};
use aspects::{AnalysisError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Returns fixed metrics and records every probed path
#[derive(Clone, Default)]
pub struct ScriptedProber {
    metrics: HashMap<String, f64>,
    calls: Arc<AtomicUsize>,
    probed: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedProber {
    pub fn new(metrics: &[(&str, f64)]) -> Self {
        Self {
            metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        }
    }

    /// Number of probe invocations so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

impl Prober for ScriptedProber {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn probe(&self, path: &Path) -> Result<ProbeMetrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.probed.lock().unwrap().push(path.to_path_buf());
        if !path.exists() {
            return Err(AnalysisError::Probe(format!("cannot open {}", path.display())));
        }
        Ok(ProbeMetrics::new(self.metrics.clone()))
    }
}
