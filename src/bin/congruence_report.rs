use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use clause_congruence::alignment::report::{
    aggregate_recordings, BatchMeta, BatchReport, RecordingOutcome, RecordingReport,
    REPORT_SCHEMA_VERSION,
};
use clause_congruence::{
    AnalysisInput, CancelSignal, CongruenceConfig, CongruenceEngine, CongruenceEngineBuilder,
};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Parser)]
#[command(name = "congruence_report")]
#[command(about = "Score emotional congruence between what was said and how it sounded")]
struct Args {
    /// Analysis bundle(s): JSON files with `transcript`, `text_sentiment` and
    /// `audio_affect`, or directories searched recursively for them.
    #[arg(long, env = "CONGRUENCE_REPORT_INPUT", value_delimiter = ',', required = true)]
    input: Vec<PathBuf>,
    #[arg(long, env = "CONGRUENCE_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "CONGRUENCE_REPORT_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "CONGRUENCE_REPORT_DIVERGENCE_THRESHOLD")]
    divergence_threshold: Option<f32>,
    #[arg(long, env = "CONGRUENCE_REPORT_MIN_ALIGNMENT_CONFIDENCE")]
    min_alignment_confidence: Option<f32>,
    #[arg(long, env = "CONGRUENCE_REPORT_TOP_K")]
    top_k: Option<usize>,
    /// Per-recording time budget; recordings that exceed it are reported as failed.
    #[arg(long, env = "CONGRUENCE_REPORT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let config = build_config(&args)?;
    let engine = CongruenceEngineBuilder::new(config.clone())
        .build()
        .map_err(|err| format!("Failed to build congruence engine: {err}"))?;

    let mut bundles = Vec::new();
    for input in &args.input {
        require_path_exists(input, "Missing analysis input.")?;
        if input.is_dir() {
            collect_bundle_files(input, &mut bundles)?;
        } else {
            bundles.push(input.clone());
        }
    }
    bundles.sort();
    bundles.dedup();
    if bundles.is_empty() {
        return Err("No analysis bundles found in the given inputs.".to_string());
    }

    let progress = ProgressBar::new(bundles.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let timeout = args.timeout_ms.map(Duration::from_millis);
    let mut recordings = Vec::with_capacity(bundles.len());
    for path in &bundles {
        let id = recording_id(path);
        progress.set_message(id.clone());
        let outcome = match analyze_bundle(&engine, path, timeout) {
            Ok(report) => RecordingOutcome::Analyzed { report },
            Err(error) => {
                progress.suspend(|| {
                    tracing::warn!(recording = id.as_str(), %error, "analysis failed")
                });
                RecordingOutcome::Failed { error }
            }
        };
        recordings.push(RecordingReport { id, outcome });
        progress.inc(1);
    }
    progress.finish_with_message("congruence pass complete");

    let aggregates = aggregate_recordings(&recordings);
    let report = BatchReport {
        schema_version: REPORT_SCHEMA_VERSION,
        meta: BatchMeta {
            generated_at: Utc::now().to_rfc3339(),
            recording_count: recordings.len(),
            divergence_threshold: config.divergence_threshold,
            min_alignment_confidence: config.min_alignment_confidence,
            top_k_worst_clauses: config.top_k_worst_clauses,
        },
        recordings,
        aggregates,
    };

    let out_path = resolve_out_path(args.out.as_ref());
    write_batch_report(&out_path, &report)?;
    println!("{}", out_path.display());
    Ok(())
}

fn build_config(args: &Args) -> Result<CongruenceConfig, String> {
    let mut config = match args.config.as_ref() {
        Some(path) => CongruenceConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => CongruenceConfig::default(),
    };
    if let Some(threshold) = args.divergence_threshold {
        config.divergence_threshold = threshold;
    }
    if let Some(min_confidence) = args.min_alignment_confidence {
        config.min_alignment_confidence = min_confidence;
    }
    if let Some(top_k) = args.top_k {
        config.top_k_worst_clauses = top_k;
    }
    config
        .validate()
        .map_err(|err| format!("Invalid configuration: {err}"))?;
    Ok(config)
}

fn analyze_bundle(
    engine: &CongruenceEngine,
    path: &Path,
    timeout: Option<Duration>,
) -> Result<clause_congruence::AnalysisReport, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read bundle '{}': {err}", path.display()))?;
    let input: AnalysisInput = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse bundle '{}': {err}", path.display()))?;

    let cancel = match timeout {
        Some(timeout) => CancelSignal::new().with_timeout(timeout),
        None => CancelSignal::new(),
    };
    engine
        .analyze_with_cancel(&input, &cancel)
        .map_err(|err| err.to_string())
}

fn collect_bundle_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = fs::read_dir(dir)
        .map_err(|err| format!("Failed to read directory '{}': {err}", dir.display()))?;
    for entry in entries {
        let entry = entry.map_err(|err| {
            format!(
                "Failed to read directory entry in '{}': {err}",
                dir.display()
            )
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_bundle_files(&path, out)?;
            continue;
        }
        if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn recording_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_out_path(out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return path.clone();
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    PathBuf::from("target")
        .join("congruence_reports")
        .join(format!("congruence-report-{run_id}.json"))
}

fn write_batch_report(path: &Path, report: &BatchReport) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!("Failed to create directory '{}': {err}", parent.display())
        })?;
    }

    let mut writer = File::create(path)
        .map(BufWriter::new)
        .map_err(|err| format!("Failed to create '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|err| format!("Failed to serialize batch report: {err}"))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;

    let counts = &report.aggregates.counts;
    tracing::info!(
        path = %path.display(),
        recordings = counts.total,
        failed = counts.failed,
        insufficient_data = counts.insufficient_data,
        "report: batch written"
    );
    Ok(())
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
