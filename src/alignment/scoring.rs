use crate::config::CongruenceConfig;
use crate::error::CongruenceError;
use crate::taxonomy::{EmotionVector, LabelPriority};
use crate::types::{AlignedClause, CongruenceResult, OverallScore, ScoredClause};

/// Thresholds and tie-break order the scorer applies to every clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub divergence_threshold: f32,
    pub min_alignment_confidence: f32,
    pub priority: LabelPriority,
}

impl ScoringPolicy {
    pub fn from_config(config: &CongruenceConfig) -> Result<Self, CongruenceError> {
        Ok(Self {
            divergence_threshold: config.divergence_threshold,
            min_alignment_confidence: config.min_alignment_confidence,
            priority: config.label_priority()?,
        })
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            divergence_threshold: CongruenceConfig::DEFAULT_DIVERGENCE_THRESHOLD,
            min_alignment_confidence: CongruenceConfig::DEFAULT_MIN_ALIGNMENT_CONFIDENCE,
            priority: LabelPriority::default(),
        }
    }
}

/// Cosine similarity in [0, 1]. Zero when either side carries no signal.
pub fn cosine_similarity(a: &EmotionVector, b: &EmotionVector) -> f32 {
    let (norm_a, norm_b) = (a.l2_norm(), b.l2_norm());
    if a.is_near_zero() || b.is_near_zero() {
        return 0.0;
    }
    let cosine = a.dot(b) / (norm_a * norm_b);
    if cosine.is_finite() {
        cosine.clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

pub fn score_clause(aligned: AlignedClause, policy: &ScoringPolicy) -> ScoredClause {
    let text = &aligned.clause.text_emotion;
    let audio = &aligned.audio_emotion;
    let score = cosine_similarity(text, audio);
    let confidence = aligned.alignment_confidence;

    // Missing signal on either side is not disagreement.
    let divergent = score < policy.divergence_threshold
        && confidence > 0.0
        && confidence >= policy.min_alignment_confidence
        && !text.is_near_zero();

    let result = CongruenceResult {
        clause_id: aligned.clause.id.clone(),
        score,
        dominant_text_emotion: text.dominant(&policy.priority),
        dominant_audio_emotion: audio.dominant(&policy.priority),
        divergent,
    };

    if divergent {
        tracing::debug!(
            clause_id = result.clause_id.as_str(),
            score,
            alignment_confidence = confidence,
            "scoring: divergent clause"
        );
    }

    ScoredClause { aligned, result }
}

/// Confidence-weighted mean of `(score, alignment_confidence)` pairs.
/// Pairs with zero confidence do not participate.
pub fn overall_score(pairs: impl IntoIterator<Item = (f32, f32)>) -> OverallScore {
    let (weighted, total) = pairs
        .into_iter()
        .filter(|&(score, confidence)| {
            score.is_finite() && confidence.is_finite() && confidence > 0.0
        })
        .fold((0.0f64, 0.0f64), |(weighted, total), (score, confidence)| {
            (
                weighted + score as f64 * confidence as f64,
                total + confidence as f64,
            )
        });
    if total > 0.0 {
        OverallScore::Scored {
            value: (weighted / total) as f32,
        }
    } else {
        OverallScore::InsufficientData
    }
}

pub fn overall_from_clauses(scored: &[ScoredClause]) -> OverallScore {
    overall_score(
        scored
            .iter()
            .map(|clause| (clause.result.score, clause.aligned.alignment_confidence)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::EmotionLabel;
    use crate::types::Clause;

    fn aligned(text: EmotionVector, audio: EmotionVector, confidence: f32) -> AlignedClause {
        AlignedClause {
            clause: Clause {
                id: "clause-1".to_string(),
                index: 0,
                start_ms: 0,
                end_ms: 1000,
                text: "fine".to_string(),
                text_emotion: text,
            },
            audio_emotion: audio,
            alignment_confidence: confidence,
            observation_count: 1,
        }
    }

    #[test]
    fn identical_vectors_score_exactly_one() {
        let v = EmotionVector::from_pairs([
            (EmotionLabel::Joy, 0.6),
            (EmotionLabel::Surprise, 0.3),
            (EmotionLabel::Neutral, 0.1),
        ]);
        assert_eq!(cosine_similarity(&v, &v), 1.0);
    }

    #[test]
    fn zero_vectors_score_zero() {
        let zero = EmotionVector::zero();
        let joy = EmotionVector::from_pairs([(EmotionLabel::Joy, 0.9)]);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &joy), 0.0);
        assert_eq!(cosine_similarity(&joy, &zero), 0.0);
    }

    #[test]
    fn score_is_symmetric_and_scale_invariant() {
        let a = EmotionVector::from_pairs([(EmotionLabel::Joy, 0.8), (EmotionLabel::Anger, 0.2)]);
        let b = EmotionVector::from_pairs([(EmotionLabel::Joy, 0.3), (EmotionLabel::Fear, 0.6)]);
        let a_half =
            EmotionVector::from_pairs([(EmotionLabel::Joy, 0.4), (EmotionLabel::Anger, 0.1)]);
        let b_half =
            EmotionVector::from_pairs([(EmotionLabel::Joy, 0.15), (EmotionLabel::Fear, 0.3)]);
        let s = cosine_similarity(&a, &b);
        assert_eq!(s, cosine_similarity(&b, &a));
        assert!((s - cosine_similarity(&a_half, &b_half)).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let joy = EmotionVector::from_pairs([(EmotionLabel::Joy, 0.9)]);
        let anger = EmotionVector::from_pairs([(EmotionLabel::Anger, 0.9)]);
        assert_eq!(cosine_similarity(&joy, &anger), 0.0);
    }

    #[test]
    fn zero_confidence_is_never_divergent() {
        let joy = EmotionVector::from_pairs([(EmotionLabel::Joy, 0.9)]);
        let anger = EmotionVector::from_pairs([(EmotionLabel::Anger, 0.9)]);
        let policy = ScoringPolicy {
            min_alignment_confidence: 0.0,
            ..ScoringPolicy::default()
        };
        let scored = score_clause(aligned(joy, anger, 0.0), &policy);
        assert_eq!(scored.result.score, 0.0);
        assert!(!scored.result.divergent);
    }

    #[test]
    fn disagreement_above_min_confidence_is_divergent() {
        let joy = EmotionVector::from_pairs([(EmotionLabel::Joy, 0.9)]);
        let anger = EmotionVector::from_pairs([(EmotionLabel::Anger, 0.9)]);
        let policy = ScoringPolicy::default();

        let scored = score_clause(aligned(joy, anger, 0.8), &policy);
        assert!(scored.result.divergent);
        assert_eq!(scored.result.dominant_text_emotion, Some(EmotionLabel::Joy));
        assert_eq!(scored.result.dominant_audio_emotion, Some(EmotionLabel::Anger));

        let weak = score_clause(aligned(joy, anger, 0.1), &policy);
        assert!(!weak.result.divergent);
    }

    #[test]
    fn silent_text_is_not_divergent() {
        let anger = EmotionVector::from_pairs([(EmotionLabel::Anger, 0.9)]);
        let scored = score_clause(
            aligned(EmotionVector::zero(), anger, 1.0),
            &ScoringPolicy::default(),
        );
        assert_eq!(scored.result.score, 0.0);
        assert_eq!(scored.result.dominant_text_emotion, None);
        assert!(!scored.result.divergent);
    }

    #[test]
    fn overall_is_confidence_weighted() {
        let overall = overall_score([(0.9, 1.0), (0.3, 0.5), (0.1, 0.0)]);
        let value = overall.value().unwrap();
        assert!((value - 0.7).abs() < 1e-6);
    }

    #[test]
    fn overall_without_confident_clauses_is_insufficient() {
        assert_eq!(overall_score([(0.5, 0.0)]), OverallScore::InsufficientData);
        assert_eq!(overall_score(std::iter::empty()), OverallScore::InsufficientData);
    }
}
