//! External Probe Cache
//!
//! One invocation of the external multi-metric probe per file backs every
//! probe-derived aspect. Results are kept in a bounded LRU map keyed by the
//! absolute file path, and the batch engine invalidates a file's entry once
//! its row has been harvested.

pub mod ffprobe;

pub use ffprobe::FfprobeProber;

use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of cached probe results
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Flat sub-metric mapping produced by one probe invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeMetrics {
    metrics: HashMap<String, f64>,
}

impl ProbeMetrics {
    pub fn new(metrics: HashMap<String, f64>) -> Self {
        Self { metrics }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Sub-metric names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.metrics.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, f64)> for ProbeMetrics {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// External multi-metric probe
///
/// Implementations block for the duration of the probe; there is no timeout.
pub trait Prober: Send + Sync {
    /// Probe name for logging
    fn name(&self) -> &'static str;

    /// Run the probe once against `path`
    fn probe(&self, path: &Path) -> Result<ProbeMetrics>;
}

/// Absolute, lexically normalized cache key for `path`
pub fn cache_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

struct CacheEntry {
    metrics: Arc<ProbeMetrics>,
    last_access: u64,
}

struct CacheInner {
    entries: HashMap<PathBuf, CacheEntry>,
    access_counter: u64,
}

/// Bounded, path-keyed cache of probe results
pub struct ProbeCache {
    prober: Box<dyn Prober>,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl ProbeCache {
    /// Create a cache of `capacity` entries (minimum 1) in front of `prober`
    pub fn new(prober: Box<dyn Prober>, capacity: usize) -> Self {
        Self {
            prober,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                access_counter: 0,
            }),
        }
    }

    /// Cache backed by the ffprobe command-line tool
    pub fn ffprobe(command: impl Into<String>, capacity: usize) -> Self {
        Self::new(Box::new(FfprobeProber::new(command)), capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(&cache_key(path))
    }

    /// Return the cached result for `path`, probing once on a miss
    ///
    /// The lock is not held while the probe runs, so two simultaneous misses
    /// on the same path may both invoke the probe.
    pub fn get_or_compute(&self, path: &Path) -> Result<Arc<ProbeMetrics>> {
        let key = cache_key(path);

        {
            let mut inner = self.lock();
            inner.access_counter += 1;
            let tick = inner.access_counter;
            if let Some(entry) = inner.entries.get_mut(&key) {
                entry.last_access = tick;
                tracing::trace!(path = %key.display(), "Probe cache hit");
                return Ok(Arc::clone(&entry.metrics));
            }
        }

        tracing::debug!(path = %key.display(), prober = self.prober.name(), "Probe cache miss");
        let metrics = Arc::new(self.prober.probe(&key)?);

        let mut inner = self.lock();
        inner.access_counter += 1;
        let tick = inner.access_counter;
        inner.entries.insert(
            key,
            CacheEntry {
                metrics: Arc::clone(&metrics),
                last_access: tick,
            },
        );
        Self::evict_to(&mut inner, self.capacity);

        Ok(metrics)
    }

    /// Remove any cached entry for `path`
    pub fn invalidate(&self, path: &Path) -> bool {
        let key = cache_key(path);
        let removed = self.lock().entries.remove(&key).is_some();
        if removed {
            tracing::trace!(path = %key.display(), "Probe cache entry invalidated");
        }
        removed
    }

    fn evict_to(inner: &mut CacheInner, capacity: usize) {
        while inner.entries.len() > capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // A panic while holding the lock leaves the map itself consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::error::AnalysisError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted prober returning fixed metrics and counting invocations
    pub struct ScriptedProber {
        pub metrics: HashMap<String, f64>,
        pub calls: Arc<AtomicUsize>,
        pub fail: bool,
    }

    impl ScriptedProber {
        pub fn new(metrics: &[(&str, f64)]) -> Self {
            Self {
                metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                calls: Arc::new(AtomicUsize::new(0)),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&[])
            }
        }
    }

    impl Prober for ScriptedProber {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn probe(&self, _path: &Path) -> Result<ProbeMetrics> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AnalysisError::Probe("scripted failure".to_string()));
            }
            Ok(ProbeMetrics::new(self.metrics.clone()))
        }
    }
}
