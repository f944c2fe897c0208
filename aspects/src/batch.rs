//! Batch Engine
//!
//! Runs the [`Analyzer`] over many files with a bounded pool of blocking
//! workers. The pool is seeded with one task per worker and refilled as
//! tasks complete, so at most `worker_count` files are in flight.
//!
//! As each file completes its probe cache entry is invalidated and its row
//! is appended. Rows follow completion order, not input order.

use crate::analyzer::Analyzer;
use crate::error::{AnalysisError, Result};
use crate::types::{AspectValue, ResultRow};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Worker-pool sizing policy
///
/// | Policy                 | Workers                          |
/// |------------------------|----------------------------------|
/// | unset, `false`, `0`    | all available parallelism        |
/// | `true`                 | 1                                |
/// | `N > 0`                | N                                |
/// | `-N`                   | total - N, at least 1            |
/// | fraction in (0, 1)     | floor(fraction * total), at least 1 |
///
/// Any other fraction is rejected with [`AnalysisError::InvalidPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConcurrencyPolicy {
    #[default]
    #[serde(skip)]
    Auto,
    Flag(bool),
    Count(i64),
    Fraction(f64),
}

impl ConcurrencyPolicy {
    /// Worker count for a machine with `total` logical workers
    pub fn resolve(self, total: usize) -> Result<usize> {
        let total = total.max(1);
        let workers = match self {
            ConcurrencyPolicy::Auto | ConcurrencyPolicy::Flag(false) | ConcurrencyPolicy::Count(0) => {
                total
            }
            ConcurrencyPolicy::Flag(true) => 1,
            ConcurrencyPolicy::Count(n) if n > 0 => n as usize,
            ConcurrencyPolicy::Count(n) => total.saturating_sub(n.unsigned_abs() as usize).max(1),
            ConcurrencyPolicy::Fraction(f) if f > 0.0 && f < 1.0 => {
                ((f * total as f64).floor() as usize).max(1)
            }
            ConcurrencyPolicy::Fraction(f) => {
                return Err(AnalysisError::InvalidPolicy(format!(
                    "fractional policy {} must lie strictly between 0 and 1",
                    f
                )));
            }
        };
        Ok(workers)
    }

    /// Worker count for this machine
    pub fn worker_count(self) -> Result<usize> {
        self.resolve(num_cpus::get())
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyPolicy::Auto => f.write_str("auto"),
            ConcurrencyPolicy::Flag(flag) => write!(f, "{}", flag),
            ConcurrencyPolicy::Count(n) => write!(f, "{}", n),
            ConcurrencyPolicy::Fraction(frac) => write!(f, "{}", frac),
        }
    }
}

impl FromStr for ConcurrencyPolicy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" | "auto" => return Ok(ConcurrencyPolicy::Auto),
            "true" => return Ok(ConcurrencyPolicy::Flag(true)),
            "false" => return Ok(ConcurrencyPolicy::Flag(false)),
            _ => {}
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(ConcurrencyPolicy::Count(n));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(ConcurrencyPolicy::Fraction(f)),
            _ => Err(AnalysisError::InvalidPolicy(format!(
                "'{}' is not a boolean, integer or fraction",
                s
            ))),
        }
    }
}

/// Outcome of one file in an isolated batch
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<ResultRow>,
}

/// Row label for `path`: the path as given, with forward slashes
pub fn path_label(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Analyze every file, aborting on the first fatal error
///
/// The failing file contributes no row and no further files are submitted.
/// Files already in flight are awaited and their cache entries invalidated
/// before the error is returned.
pub async fn analyze_batch<S: AsRef<str>>(
    analyzer: &Analyzer,
    paths: &[PathBuf],
    aspects: &[S],
    policy: ConcurrencyPolicy,
) -> Result<Vec<ResultRow>> {
    let mut rows = Vec::with_capacity(paths.len());
    run_pool(analyzer, paths, aspects, policy, |path, result| {
        rows.push(ResultRow::new(path_label(&path), result?));
        Ok(())
    })
    .await?;
    Ok(rows)
}

/// Analyze every file, reporting each file's row or error
///
/// A fatal error for one file never affects the others. Outcomes follow
/// completion order.
pub async fn analyze_batch_isolated<S: AsRef<str>>(
    analyzer: &Analyzer,
    paths: &[PathBuf],
    aspects: &[S],
    policy: ConcurrencyPolicy,
) -> Result<Vec<FileOutcome>> {
    let mut outcomes = Vec::with_capacity(paths.len());
    run_pool(analyzer, paths, aspects, policy, |path, result| {
        if let Err(e) = &result {
            warn!(path = %path.display(), error = %e, "File analysis failed");
        }
        let result = result.map(|values| ResultRow::new(path_label(&path), values));
        outcomes.push(FileOutcome { path, result });
        Ok(())
    })
    .await?;
    Ok(outcomes)
}

/// Drive the worker pool, handing each completed file to `on_complete`
///
/// An error returned by `on_complete` stops submission. The remaining
/// in-flight tasks are drained, so every submitted file has its cache entry
/// invalidated, and the first error is returned.
async fn run_pool<S, F>(
    analyzer: &Analyzer,
    paths: &[PathBuf],
    aspects: &[S],
    policy: ConcurrencyPolicy,
    mut on_complete: F,
) -> Result<()>
where
    S: AsRef<str>,
    F: FnMut(PathBuf, Result<Vec<AspectValue>>) -> Result<()>,
{
    let workers = policy.worker_count()?;
    if paths.is_empty() {
        return Ok(());
    }

    let aspects: Arc<[String]> = aspects.iter().map(|a| a.as_ref().to_string()).collect();

    info!(
        file_count = paths.len(),
        aspect_count = aspects.len(),
        workers,
        policy = %policy,
        "Starting batch analysis"
    );

    let mut path_iter = paths.iter();
    let mut tasks = FuturesUnordered::new();

    // Seed initial batch of tasks
    for path in path_iter.by_ref().take(workers) {
        tasks.push(spawn_file_task(analyzer, path.clone(), Arc::clone(&aspects)));
    }

    let mut completed = 0usize;
    let mut failure: Option<AnalysisError> = None;
    while let Some((path, result)) = tasks.next().await {
        analyzer.probe_cache().invalidate(&path);
        completed += 1;
        debug!(
            path = %path.display(),
            ok = result.is_ok(),
            completed,
            total = paths.len(),
            "File task complete"
        );

        // Draining after an abort
        if failure.is_some() {
            continue;
        }

        if let Err(e) = on_complete(path, result) {
            warn!(
                error = %e,
                in_flight = tasks.len(),
                "Batch aborted, draining in-flight files"
            );
            failure = Some(e);
            continue;
        }

        if let Some(path) = path_iter.next() {
            tasks.push(spawn_file_task(analyzer, path.clone(), Arc::clone(&aspects)));
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }

    info!(file_count = completed, "Batch analysis complete");
    Ok(())
}

fn spawn_file_task(
    analyzer: &Analyzer,
    path: PathBuf,
    aspects: Arc<[String]>,
) -> impl Future<Output = (PathBuf, Result<Vec<AspectValue>>)> {
    let analyzer = analyzer.clone();
    let task_path = path.clone();
    let handle =
        tokio::task::spawn_blocking(move || analyzer.analyze_file(&task_path, &aspects[..]));

    async move {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(AnalysisError::Task(e.to_string())),
        };
        (path, result)
    }
}
