//! aspects - batch audio aspect analysis
//!
//! Analyzes every input file (directories are walked recursively) for the
//! requested aspects and writes one tab-delimited row per file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use aspects::batch::{analyze_batch, analyze_batch_isolated};
use aspects::table::{write_delimited, DEFAULT_OUTPUT};
use aspects::{Analyzer, AspectsConfig, ConcurrencyPolicy};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

/// Command-line arguments for aspects
#[derive(Parser, Debug)]
#[command(name = "aspects")]
#[command(about = "Measure audio aspects for many files")]
#[command(version)]
struct Args {
    /// Audio files or directories to analyze
    #[arg(required_unless_present = "list")]
    inputs: Vec<PathBuf>,

    /// Comma-separated aspect names (default: configured list)
    #[arg(short, long, value_delimiter = ',')]
    aspects: Vec<String>,

    /// Worker policy: true, false, N, -N or a fraction in (0, 1)
    #[arg(short = 'j', long, env = "ASPECTS_CONCURRENCY", allow_negative_numbers = true)]
    concurrency: Option<ConcurrencyPolicy>,

    /// Output table path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// File extension to collect from directories
    #[arg(short, long, default_value = "wav")]
    extension: String,

    /// Report failed files instead of aborting the batch
    #[arg(long)]
    isolate_failures: bool,

    /// Print every available aspect name and exit
    #[arg(long)]
    list: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AspectsConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let analyzer = Analyzer::from_config(&config);

    if args.list {
        for name in analyzer.list_available_aspects() {
            println!("{}", name);
        }
        return Ok(());
    }

    let aspects = if args.aspects.is_empty() {
        config.aspects.clone()
    } else {
        args.aspects
    };
    let policy = args.concurrency.unwrap_or(config.concurrency);

    let files = collect_files(&args.inputs, &args.extension)?;
    info!(
        file_count = files.len(),
        aspect_count = aspects.len(),
        "Collected input files"
    );

    let rows = if args.isolate_failures {
        let outcomes = analyze_batch_isolated(&analyzer, &files, &aspects, policy).await?;
        let mut rows = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(row) => rows.push(row),
                Err(e) => warn!(path = %outcome.path.display(), error = %e, "Skipping file"),
            }
        }
        rows
    } else {
        analyze_batch(&analyzer, &files, &aspects, policy)
            .await
            .context("Batch analysis failed")?
    };

    write_delimited(&args.output, &aspects, &rows)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        rows = rows.len(),
        output = %args.output.display(),
        "Analysis complete"
    );
    Ok(())
}

/// Expand inputs into a file list, walking directories for `extension`
fn collect_files(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("Failed to walk {}", input.display()))?;
                if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                    files.push(entry.into_path());
                }
            }
        } else if input.exists() {
            files.push(input.clone());
        } else {
            bail!("Input not found: {}", input.display());
        }
    }
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
        .unwrap_or(false)
}
