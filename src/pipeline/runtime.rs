use std::time::Instant;

use rayon::prelude::*;

use crate::alignment::report::{
    assemble_report, AnalysisReport, ConventionsApplied, ReportContext,
    NOTE_AUDIO_ENDS_BEFORE_TRANSCRIPT, NOTE_NO_AUDIO,
};
use crate::alignment::temporal::audio_ends_before_transcript;
use crate::config::CongruenceConfig;
use crate::error::CongruenceError;
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::traits::{ClauseSegmenter, CongruenceScorer, SignalNormalizer, TemporalAligner};
use crate::types::{
    AlignedClause, AnalysisInput, AudioAffect, ScoredClause, TextSentiment, Transcript,
    WarningLog,
};

/// Runs the five analysis stages over one recording at a time. Immutable and
/// shareable across threads; every run owns its intermediate data.
pub struct CongruenceEngine {
    config: CongruenceConfig,
    segmenter: Box<dyn ClauseSegmenter>,
    normalizer: Box<dyn SignalNormalizer>,
    aligner: Box<dyn TemporalAligner>,
    scorer: Box<dyn CongruenceScorer>,
}

pub(crate) struct CongruenceEngineParts {
    pub config: CongruenceConfig,
    pub segmenter: Box<dyn ClauseSegmenter>,
    pub normalizer: Box<dyn SignalNormalizer>,
    pub aligner: Box<dyn TemporalAligner>,
    pub scorer: Box<dyn CongruenceScorer>,
}

impl CongruenceEngine {
    pub(crate) fn from_parts(parts: CongruenceEngineParts) -> Self {
        Self {
            config: parts.config,
            segmenter: parts.segmenter,
            normalizer: parts.normalizer,
            aligner: parts.aligner,
            scorer: parts.scorer,
        }
    }

    pub fn config(&self) -> &CongruenceConfig {
        &self.config
    }

    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisReport, CongruenceError> {
        self.analyze_with_cancel(input, &CancelSignal::new())
    }

    pub fn analyze_with_cancel(
        &self,
        input: &AnalysisInput,
        cancel: &CancelSignal,
    ) -> Result<AnalysisReport, CongruenceError> {
        self.run(
            &input.transcript,
            &input.text_sentiment,
            &input.audio_affect,
            cancel,
        )
    }

    pub(crate) fn run(
        &self,
        transcript: &Transcript,
        text_sentiment: &TextSentiment,
        audio_affect: &AudioAffect,
        cancel: &CancelSignal,
    ) -> Result<AnalysisReport, CongruenceError> {
        let started = Instant::now();
        let mut log = WarningLog::new();

        cancel.check("segmentation")?;
        let spans = self
            .segmenter
            .segment(transcript, &text_sentiment.segments)?;

        cancel.check("normalization")?;
        let clauses = self
            .normalizer
            .attach_text(spans, text_sentiment, &mut log)?;
        let observations = self.normalizer.observations(audio_affect, &mut log)?;

        cancel.check("alignment")?;
        let aligned = self.aligner.align(clauses, &observations, cancel)?;

        let mut notes = Vec::new();
        if observations.is_empty() && !aligned.is_empty() {
            notes.push(NOTE_NO_AUDIO.to_string());
        } else if audio_ends_before_transcript(&aligned, &observations) {
            tracing::warn!(
                clause_count = aligned.len(),
                "analysis: audio stream ends before the transcript"
            );
            notes.push(NOTE_AUDIO_ENDS_BEFORE_TRANSCRIPT.to_string());
        }

        cancel.check("scoring")?;
        let scored = self.score_all(aligned, cancel)?;
        let overall_score = self.scorer.overall(&scored);

        cancel.check("report")?;
        let report = assemble_report(
            scored,
            overall_score,
            ReportContext {
                top_k_worst_clauses: self.config.top_k_worst_clauses,
                conventions: ConventionsApplied {
                    text: self.config.text_scale,
                    audio: self.config.audio_scale,
                },
                warnings: log.into_vec(),
                notes,
            },
        )?;

        tracing::info!(
            clauses = report.aggregate.counts.total,
            scored = report.aggregate.counts.scored,
            divergent = report.aggregate.stats.divergent_count,
            overall = ?report.aggregate.overall_score.value(),
            warnings = report.warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis: complete"
        );
        Ok(report)
    }

    fn score_all(
        &self,
        aligned: Vec<AlignedClause>,
        cancel: &CancelSignal,
    ) -> Result<Vec<ScoredClause>, CongruenceError> {
        let step = |clause: AlignedClause| -> Result<ScoredClause, CongruenceError> {
            cancel.check("scoring")?;
            Ok(self.scorer.score(clause))
        };
        if aligned.len() >= self.config.parallel_clause_threshold.max(1) {
            aligned.into_par_iter().map(step).collect()
        } else {
            aligned.into_iter().map(step).collect()
        }
    }
}
