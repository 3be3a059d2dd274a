//! Attribution of audio-affect observations to clause windows.
//!
//! An interval observation `[a, b)` contributes to a clause `[s, e)` in
//! proportion to the share of its own duration that falls inside the window,
//! so a sample straddling a boundary is split across both neighbours and its
//! total weight is preserved. A point observation belongs wholly to the clause
//! whose window contains its timestamp; its implicit span only counts towards
//! that clause's coverage.

use rayon::prelude::*;

use crate::alignment::overlap_ms;
use crate::error::CongruenceError;
use crate::pipeline::cancel::CancelSignal;
use crate::taxonomy::EmotionVector;
use crate::types::{AffectObservation, AlignedClause, Clause};


/// One observation's share of a clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapContribution {
    pub overlap_ms: u64,
    /// `overlap_ms / observation duration` in [0, 1]; 1 for a point inside
    /// the clause.
    pub fraction: f64,
    /// `fraction * confidence`.
    pub weight: f64,
}

pub fn contribution(
    clause: &Clause,
    observation: &AffectObservation,
) -> Option<OverlapContribution> {
    let duration_ms = observation.duration_ms();
    if duration_ms == 0 {
        return None;
    }
    let overlap = overlap_ms(
        clause.start_ms,
        clause.end_ms,
        observation.start_ms,
        observation.end_ms,
    );
    let fraction = match observation.anchor_ms {
        Some(anchor_ms) if (clause.start_ms..clause.end_ms).contains(&anchor_ms) => 1.0,
        Some(_) => return None,
        None if overlap == 0 => return None,
        None => overlap as f64 / duration_ms as f64,
    };
    Some(OverlapContribution {
        overlap_ms: overlap,
        fraction,
        weight: fraction * observation.confidence as f64,
    })
}

/// Aligns a single clause. `observations` must be sorted by `start_ms`.
pub fn align_clause(clause: Clause, observations: &[AffectObservation]) -> AlignedClause {
    let candidates_end = observations.partition_point(|o| o.start_ms < clause.end_ms);
    let overlapping: Vec<(&AffectObservation, OverlapContribution)> = observations
        [..candidates_end]
        .iter()
        .filter_map(|observation| contribution(&clause, observation).map(|c| (observation, c)))
        .collect();

    let audio_emotion = EmotionVector::weighted_mean(
        overlapping
            .iter()
            .map(|(observation, c)| (&observation.emotion, c.weight)),
    );

    let (audio_emotion, alignment_confidence) = match audio_emotion {
        Some(vector) => {
            let covered: f64 = overlapping
                .iter()
                .map(|(observation, c)| c.overlap_ms as f64 * observation.confidence as f64)
                .sum();
            let duration_ms = clause.duration_ms().max(1) as f64;
            (vector, (covered / duration_ms).min(1.0) as f32)
        }
        None => (EmotionVector::zero(), 0.0),
    };

    tracing::trace!(
        clause_id = clause.id.as_str(),
        observation_count = overlapping.len(),
        alignment_confidence,
        "alignment: clause aligned"
    );

    AlignedClause {
        observation_count: overlapping.len(),
        clause,
        audio_emotion,
        alignment_confidence,
    }
}

/// Aligns every clause against the shared observation slice. Switches to the
/// rayon pool once `parallel_threshold` clauses are reached; output order is
/// always clause order.
pub fn align_clauses(
    clauses: Vec<Clause>,
    observations: &[AffectObservation],
    parallel_threshold: usize,
    cancel: &CancelSignal,
) -> Result<Vec<AlignedClause>, CongruenceError> {
    let step = |clause: Clause| -> Result<AlignedClause, CongruenceError> {
        cancel.check("alignment")?;
        Ok(align_clause(clause, observations))
    };

    let parallel = clauses.len() >= parallel_threshold.max(1);
    tracing::debug!(
        clause_count = clauses.len(),
        observation_count = observations.len(),
        parallel,
        "alignment: attributing audio observations to clauses"
    );

    if parallel {
        clauses.into_par_iter().map(step).collect()
    } else {
        clauses.into_iter().map(step).collect()
    }
}

/// True when the audio stream stops before the final clause begins, leaving
/// the tail of the transcript without any audio evidence.
pub fn audio_ends_before_transcript(
    clauses: &[AlignedClause],
    observations: &[AffectObservation],
) -> bool {
    let Some(last_clause) = clauses.last() else {
        return false;
    };
    let Some(audio_end) = observations.iter().map(|o| o.end_ms).max() else {
        return false;
    };
    audio_end <= last_clause.clause.start_ms
}
