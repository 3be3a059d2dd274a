use crate::alignment::normalization::TaxonomyNormalizer;
use crate::alignment::scoring::{overall_from_clauses, score_clause, ScoringPolicy};
use crate::alignment::segmentation::segment_clauses;
use crate::alignment::temporal::align_clauses;
use crate::config::CongruenceConfig;
use crate::error::CongruenceError;
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::traits::{ClauseSegmenter, CongruenceScorer, SignalNormalizer, TemporalAligner};
use crate::types::{
    AffectObservation, AlignedClause, AudioAffect, Clause, ClauseSpan, OverallScore,
    ScoredClause, SentimentSegment, TextSentiment, Transcript, WarningLog,
};

pub struct BoundarySegmenter;

impl ClauseSegmenter for BoundarySegmenter {
    fn segment(
        &self,
        transcript: &Transcript,
        segments: &[SentimentSegment],
    ) -> Result<Vec<ClauseSpan>, CongruenceError> {
        segment_clauses(transcript, segments)
    }
}

impl SignalNormalizer for TaxonomyNormalizer {
    fn attach_text(
        &self,
        spans: Vec<ClauseSpan>,
        sentiment: &TextSentiment,
        log: &mut WarningLog,
    ) -> Result<Vec<Clause>, CongruenceError> {
        TaxonomyNormalizer::attach_text(self, spans, sentiment, log)
    }

    fn observations(
        &self,
        affect: &AudioAffect,
        log: &mut WarningLog,
    ) -> Result<Vec<AffectObservation>, CongruenceError> {
        TaxonomyNormalizer::observations(self, affect, log)
    }
}

pub struct OverlapAligner {
    pub parallel_clause_threshold: usize,
}

impl OverlapAligner {
    pub fn from_config(config: &CongruenceConfig) -> Self {
        Self {
            parallel_clause_threshold: config.parallel_clause_threshold,
        }
    }
}

impl Default for OverlapAligner {
    fn default() -> Self {
        Self {
            parallel_clause_threshold: CongruenceConfig::DEFAULT_PARALLEL_CLAUSE_THRESHOLD,
        }
    }
}

impl TemporalAligner for OverlapAligner {
    fn align(
        &self,
        clauses: Vec<Clause>,
        observations: &[AffectObservation],
        cancel: &CancelSignal,
    ) -> Result<Vec<AlignedClause>, CongruenceError> {
        align_clauses(clauses, observations, self.parallel_clause_threshold, cancel)
    }
}

pub struct CosineScorer {
    pub policy: ScoringPolicy,
}

impl CongruenceScorer for CosineScorer {
    fn score(&self, aligned: AlignedClause) -> ScoredClause {
        score_clause(aligned, &self.policy)
    }

    fn overall(&self, scored: &[ScoredClause]) -> OverallScore {
        overall_from_clauses(scored)
    }
}
