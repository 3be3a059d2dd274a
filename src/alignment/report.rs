use std::cmp::Ordering;

use serde::Serialize;

use crate::error::CongruenceError;
use crate::taxonomy::{EmotionVector, ScoreConvention};
use crate::types::{AnalysisWarning, CongruenceResult, OverallScore, ScoredClause};

pub const REPORT_SCHEMA_VERSION: u32 = 1;
pub const NOTE_AUDIO_ENDS_BEFORE_TRANSCRIPT: &str = "audio_ends_before_transcript";
pub const NOTE_NO_CLAUSES: &str = "no_clauses";
pub const NOTE_NO_AUDIO: &str = "no_audio_observations";

const BATCH_OUTLIER_TOP_N: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub clauses: Vec<ClauseReport>,
    pub aggregate: AggregateReport,
    pub conventions: ConventionsApplied,
    pub warnings: Vec<AnalysisWarning>,
    pub notes: Vec<String>,
}

impl AnalysisReport {
    pub fn overall_score(&self) -> OverallScore {
        self.aggregate.overall_score
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClauseReport {
    #[serde(flatten)]
    pub result: CongruenceResult,
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub text_emotion: EmotionVector,
    pub audio_emotion: EmotionVector,
    pub alignment_confidence: f32,
    pub observation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub overall_score: OverallScore,
    /// Lowest-scoring clauses with audio evidence, most divergent first.
    /// Clauses without text signal come last.
    pub worst_clauses: Vec<CongruenceResult>,
    pub stats: ScoreStatistics,
    pub counts: ClauseCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreStatistics {
    /// Over clauses with `alignment_confidence > 0`; absent when there are none.
    pub mean: Option<f32>,
    /// Population variance over the same clauses.
    pub variance: Option<f32>,
    pub divergent_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<MetricDistribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClauseCounts {
    pub total: u32,
    pub scored: u32,
    pub zero_confidence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConventionsApplied {
    pub text: ScoreConvention,
    pub audio: ScoreConvention,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

/// Run-level context the assembler copies into the report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub top_k_worst_clauses: usize,
    pub conventions: ConventionsApplied,
    pub warnings: Vec<AnalysisWarning>,
    pub notes: Vec<String>,
}

pub fn assemble_report(
    scored: Vec<ScoredClause>,
    overall_score: OverallScore,
    context: ReportContext,
) -> Result<AnalysisReport, CongruenceError> {
    let ReportContext {
        top_k_worst_clauses,
        conventions,
        mut warnings,
        mut notes,
    } = context;

    if scored.is_empty() {
        notes.push(NOTE_NO_CLAUSES.to_string());
    }
    if overall_score == OverallScore::InsufficientData {
        warnings.push(AnalysisWarning::InsufficientData {
            clause_count: scored.len(),
        });
    }

    let with_audio: Vec<&ScoredClause> = scored
        .iter()
        .filter(|clause| clause.aligned.alignment_confidence > 0.0)
        .collect();
    let scores: Vec<f64> = with_audio
        .iter()
        .map(|clause| clause.result.score as f64)
        .collect();

    let stats = ScoreStatistics {
        mean: (!scores.is_empty())
            .then(|| checked_f32(mean(&scores), "stats.mean"))
            .transpose()?,
        variance: (!scores.is_empty())
            .then(|| checked_f32(population_variance(&scores), "stats.variance"))
            .transpose()?,
        divergent_count: to_u32(scored.iter().filter(|clause| clause.result.divergent).count()),
        distribution: distribution_or_none(&scores)?,
    };
    let counts = ClauseCounts {
        total: to_u32(scored.len()),
        scored: to_u32(with_audio.len()),
        zero_confidence: to_u32(scored.len() - with_audio.len()),
    };
    let worst_clauses = worst_clauses(&with_audio, top_k_worst_clauses);

    tracing::debug!(
        clause_count = counts.total,
        scored = counts.scored,
        divergent = stats.divergent_count,
        worst = worst_clauses.len(),
        "report: assembled"
    );

    let clauses = scored
        .into_iter()
        .map(|ScoredClause { aligned, result }| ClauseReport {
            result,
            index: aligned.clause.index,
            start_ms: aligned.clause.start_ms,
            end_ms: aligned.clause.end_ms,
            text: aligned.clause.text,
            text_emotion: aligned.clause.text_emotion,
            audio_emotion: aligned.audio_emotion,
            alignment_confidence: aligned.alignment_confidence,
            observation_count: aligned.observation_count,
        })
        .collect();

    Ok(AnalysisReport {
        schema_version: REPORT_SCHEMA_VERSION,
        clauses,
        aggregate: AggregateReport {
            overall_score,
            worst_clauses,
            stats,
            counts,
        },
        conventions,
        warnings,
        notes,
    })
}

/// Clauses without text signal score 0 but are not disagreements; they rank
/// after every clause that carries signal on both sides.
fn worst_clauses(with_audio: &[&ScoredClause], top_k: usize) -> Vec<CongruenceResult> {
    let mut ranked = with_audio.to_vec();
    ranked.sort_by(|a, b| {
        let a_silent = a.aligned.clause.text_emotion.is_near_zero();
        let b_silent = b.aligned.clause.text_emotion.is_near_zero();
        a_silent
            .cmp(&b_silent)
            .then_with(|| {
                a.result
                    .score
                    .partial_cmp(&b.result.score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.aligned.clause.index.cmp(&b.aligned.clause.index))
    });
    ranked
        .into_iter()
        .take(top_k)
        .map(|clause| clause.result.clone())
        .collect()
}

/// Outcome of analyzing one recording in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordingOutcome {
    Analyzed { report: AnalysisReport },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordingReport {
    pub id: String,
    #[serde(flatten)]
    pub outcome: RecordingOutcome,
}

impl RecordingReport {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.outcome {
            RecordingOutcome::Analyzed { report } => Some(report),
            RecordingOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub schema_version: u32,
    pub meta: BatchMeta,
    pub recordings: Vec<RecordingReport>,
    pub aggregates: BatchAggregate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchMeta {
    pub generated_at: String,
    pub recording_count: usize,
    pub divergence_threshold: f32,
    pub min_alignment_confidence: f32,
    pub top_k_worst_clauses: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAggregate {
    pub counts: BatchCounts,
    pub overall_score: Option<MetricDistribution>,
    pub divergent_ratio: Option<MetricDistribution>,
    pub mean_alignment_confidence: Option<MetricDistribution>,
    /// Recordings with the lowest overall score.
    pub least_congruent: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCounts {
    pub total: u32,
    pub analyzed: u32,
    pub failed: u32,
    pub insufficient_data: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f32,
}

pub fn aggregate_recordings(recordings: &[RecordingReport]) -> BatchAggregate {
    let analyzed: Vec<(&str, &AnalysisReport)> = recordings
        .iter()
        .filter_map(|recording| recording.report().map(|report| (recording.id.as_str(), report)))
        .collect();

    let overall: Vec<(&str, f64)> = analyzed
        .iter()
        .filter_map(|(id, report)| report.overall_score().value().map(|v| (*id, v as f64)))
        .collect();
    let divergent_ratio: Vec<f64> = analyzed
        .iter()
        .filter(|(_, report)| report.aggregate.counts.total > 0)
        .map(|(_, report)| {
            report.aggregate.stats.divergent_count as f64 / report.aggregate.counts.total as f64
        })
        .collect();
    let mean_confidence: Vec<f64> = analyzed
        .iter()
        .filter(|(_, report)| !report.clauses.is_empty())
        .map(|(_, report)| {
            let confidences: Vec<f64> = report
                .clauses
                .iter()
                .map(|clause| clause.alignment_confidence as f64)
                .collect();
            mean(&confidences)
        })
        .collect();

    let overall_values: Vec<f64> = overall.iter().map(|(_, v)| *v).collect();

    BatchAggregate {
        counts: BatchCounts {
            total: to_u32(recordings.len()),
            analyzed: to_u32(analyzed.len()),
            failed: to_u32(recordings.len() - analyzed.len()),
            insufficient_data: to_u32(analyzed.len() - overall.len()),
        },
        overall_score: distribution_or_none(&overall_values).ok().flatten(),
        divergent_ratio: distribution_or_none(&divergent_ratio).ok().flatten(),
        mean_alignment_confidence: distribution_or_none(&mean_confidence).ok().flatten(),
        least_congruent: lowest_ranked(&overall, BATCH_OUTLIER_TOP_N),
    }
}

fn lowest_ranked(values: &[(&str, f64)], top_n: usize) -> Vec<OutlierEntry> {
    let mut entries: Vec<OutlierEntry> = values
        .iter()
        .map(|(id, value)| OutlierEntry {
            id: id.to_string(),
            value: *value as f32,
        })
        .collect();
    entries.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(top_n);
    entries
}

fn distribution_or_none(values: &[f64]) -> Result<Option<MetricDistribution>, CongruenceError> {
    if values.is_empty() {
        return Ok(None);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(Some(MetricDistribution {
        mean: checked_f32(mean(&sorted), "distribution.mean")?,
        p50: checked_f32(percentile_sorted(&sorted, 0.5), "distribution.p50")?,
        p90: checked_f32(percentile_sorted(&sorted, 0.9), "distribution.p90")?,
        p95: checked_f32(percentile_sorted(&sorted, 0.95), "distribution.p95")?,
        p99: checked_f32(percentile_sorted(&sorted, 0.99), "distribution.p99")?,
    }))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked_f32(value: f64, metric_name: &str) -> Result<f32, CongruenceError> {
    if !value.is_finite() {
        return Err(CongruenceError::invalid_input(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    Ok(value as f32)
}
