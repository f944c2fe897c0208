//! ffprobe multi-metric prober
//!
//! Runs `ffprobe` once over a lavfi `amovie` source with a fixed filter chain
//! (per-channel and overall `astats`, `aspectralstats`, `ebur128`) and
//! flattens the per-frame metadata tags into one sub-metric mapping.
//!
//! Flattening rules:
//! - `aspectralstats`: mean over every frame and channel
//! - `r128`: value reported by the last frame carrying the tag
//! - `astats`: last frame; the `Overall` value when present, otherwise the
//!   mean over channels

use super::{ProbeMetrics, Prober};
use crate::error::{AnalysisError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::process::{Command, Stdio};

/// Default probe command
pub const FFPROBE_COMMAND: &str = "ffprobe";

/// Fixed filter chain applied to every probed file
const FILTER_CHAIN: [&str; 3] = [
    "astats=metadata=1:measure_perchannel=Crest_factor+Zero_crossings_rate+Dynamic_range:measure_overall=all",
    "aspectralstats",
    "ebur128=metadata=1:framelog=quiet",
];

/// Prober backed by the ffprobe command-line tool
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    command: String,
}

impl FfprobeProber {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Check if the probe command can be executed
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Full argument list for probing `path`
    pub fn arguments(path: &Path) -> Vec<String> {
        let source = format!(
            "amovie={},{}",
            escape_lavfi_path(path),
            FILTER_CHAIN.join(",")
        );
        vec![
            "-hide_banner".to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            source,
            "-show_entries".to_string(),
            "frame_tags".to_string(),
            "-output_format".to_string(),
            "json=compact=1".to_string(),
        ]
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(FFPROBE_COMMAND)
    }
}

impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<ProbeMetrics> {
        tracing::debug!(path = %path.display(), command = %self.command, "Running probe");

        let output = Command::new(&self.command)
            .args(Self::arguments(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                AnalysisError::Probe(format!("Failed to execute {}: {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::Probe(format!(
                "{} exited with {:?} for {}: {}",
                self.command,
                output.status.code(),
                path.display(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metrics = parse_probe_output(&stdout)?;

        tracing::debug!(
            path = %path.display(),
            metric_count = metrics.len(),
            "Probe complete"
        );

        Ok(metrics)
    }
}

/// Escape a file path for use as a lavfi `amovie` option value
///
/// Two levels apply: the option value (`\`, `'`, `:`) and then the
/// filtergraph description (`\`, `'`, `[`, `]`, `,`, `;`). Windows separators
/// are converted to forward slashes first.
pub fn escape_lavfi_path(path: &Path) -> String {
    let posix = path.to_string_lossy().replace('\\', "/");
    let option_level = escape_chars(&posix, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(input: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    frames: Vec<ProbeFrame>,
}

#[derive(Debug, Deserialize)]
struct ProbeFrame {
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Default)]
struct Collected {
    /// metric -> every value across frames and channels
    spectral: BTreeMap<String, Vec<f64>>,
    /// metric -> last reported value
    loudness: BTreeMap<String, f64>,
    /// metric -> (overall value, channel -> last value)
    levels: BTreeMap<String, (Option<f64>, BTreeMap<String, f64>)>,
}

/// Parse ffprobe JSON output into a flat sub-metric mapping
pub fn parse_probe_output(json: &str) -> Result<ProbeMetrics> {
    let document: ProbeDocument = serde_json::from_str(json)
        .map_err(|e| AnalysisError::Probe(format!("Failed to parse probe output: {}", e)))?;

    let mut collected = Collected::default();

    for frame in &document.frames {
        for (tag, raw) in &frame.tags {
            let Some(rest) = tag.strip_prefix("lavfi.") else {
                continue;
            };
            let Some((filter, key)) = rest.split_once('.') else {
                continue;
            };
            let Ok(value) = raw.trim().parse::<f64>() else {
                tracing::trace!(tag = %tag, value = %raw, "Ignoring non-numeric probe tag");
                continue;
            };

            match filter {
                "aspectralstats" => {
                    let metric = key.rsplit('.').next().unwrap_or(key);
                    collected
                        .spectral
                        .entry(metric.to_string())
                        .or_default()
                        .push(value);
                }
                "r128" => {
                    collected.loudness.insert(key.to_string(), value);
                }
                "astats" => {
                    let (channel, metric) = key.split_once('.').unwrap_or(("Overall", key));
                    let entry = collected.levels.entry(metric.to_string()).or_default();
                    if channel == "Overall" {
                        entry.0 = Some(value);
                    } else {
                        entry.1.insert(channel.to_string(), value);
                    }
                }
                _ => {}
            }
        }
    }

    let mut metrics = HashMap::new();

    for (metric, values) in collected.spectral {
        metrics.insert(metric, mean(&values));
    }
    for (metric, value) in collected.loudness {
        metrics.insert(metric, value);
    }
    for (metric, (overall, channels)) in collected.levels {
        let value = match overall {
            Some(value) => value,
            None => mean(&channels.into_values().collect::<Vec<_>>()),
        };
        metrics.insert(metric, value);
    }

    Ok(ProbeMetrics::new(metrics))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
