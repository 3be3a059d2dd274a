use crate::error::CongruenceError;
use crate::pipeline::cancel::CancelSignal;
use crate::types::{
    AffectObservation, AlignedClause, AudioAffect, Clause, ClauseSpan, OverallScore,
    ScoredClause, SentimentSegment, TextSentiment, Transcript, WarningLog,
};

pub trait ClauseSegmenter: Send + Sync {
    fn segment(
        &self,
        transcript: &Transcript,
        segments: &[SentimentSegment],
    ) -> Result<Vec<ClauseSpan>, CongruenceError>;
}

pub trait SignalNormalizer: Send + Sync {
    fn attach_text(
        &self,
        spans: Vec<ClauseSpan>,
        sentiment: &TextSentiment,
        log: &mut WarningLog,
    ) -> Result<Vec<Clause>, CongruenceError>;

    fn observations(
        &self,
        affect: &AudioAffect,
        log: &mut WarningLog,
    ) -> Result<Vec<AffectObservation>, CongruenceError>;
}

pub trait TemporalAligner: Send + Sync {
    fn align(
        &self,
        clauses: Vec<Clause>,
        observations: &[AffectObservation],
        cancel: &CancelSignal,
    ) -> Result<Vec<AlignedClause>, CongruenceError>;
}

pub trait CongruenceScorer: Send + Sync {
    fn score(&self, aligned: AlignedClause) -> ScoredClause;

    fn overall(&self, scored: &[ScoredClause]) -> OverallScore;
}
