//! Signal normalization onto the canonical emotion taxonomy.
//!
//! Label resolution is a fixed lookup: the raw label is reduced to its
//! `label_key` form, configured aliases are consulted first, then the built-in
//! synonym table. Anything else is dropped with a warning. Numbers are read
//! according to the `ScoreConvention` configured for the source classifier.

use std::collections::HashMap;

use serde_json::Value;

use crate::alignment::overlap_ms;
use crate::config::CongruenceConfig;
use crate::error::CongruenceError;
use crate::taxonomy::{ClassifierKind, EmotionLabel, EmotionVector, ScoreConvention};
use crate::types::{
    AffectObservation, AnalysisWarning, AudioAffect, Clause, ClauseSpan, SampleTiming,
    TextSentiment, WarningLog,
};

pub(crate) mod emoji;
mod scores;
mod synonyms;

use scores::{parse_scores, RawScores};

pub const DEFAULT_POINT_SAMPLE_SPAN_MS: u64 = 1_000;

/// Lower-cased alphanumeric form used for every label comparison.
pub fn label_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TaxonomyNormalizer {
    aliases: HashMap<String, EmotionLabel>,
    text_scale: ScoreConvention,
    audio_scale: ScoreConvention,
    point_sample_span_ms: Option<u64>,
}

impl TaxonomyNormalizer {
    pub fn from_config(config: &CongruenceConfig) -> Self {
        Self {
            aliases: config
                .label_aliases
                .iter()
                .map(|(alias, &label)| (label_key(alias), label))
                .collect(),
            text_scale: config.text_scale,
            audio_scale: config.audio_scale,
            point_sample_span_ms: config.point_sample_span_ms,
        }
    }

    pub fn convention(&self, classifier: ClassifierKind) -> ScoreConvention {
        match classifier {
            ClassifierKind::Text => self.text_scale,
            ClassifierKind::Audio => self.audio_scale,
        }
    }

    pub fn map_label(&self, raw: &str) -> Option<EmotionLabel> {
        let key = label_key(raw);
        self.aliases
            .get(&key)
            .copied()
            .or_else(|| synonyms::lookup(&key))
    }

    /// Folds one raw score structure onto the taxonomy. `Err` means the
    /// structure is unparseable; unmapped labels only produce warnings.
    pub fn to_vector(
        &self,
        classifier: ClassifierKind,
        value: &Value,
        log: &mut WarningLog,
    ) -> Result<EmotionVector, String> {
        let convention = self.convention(classifier);
        let raw = parse_scores(value, convention)?;
        let labeled = match raw {
            RawScores::Labeled(pairs) => rescale(pairs, convention),
            RawScores::EmojiDistribution(probabilities) => probabilities
                .into_iter()
                .enumerate()
                .filter_map(|(emoji_id, p)| {
                    emoji::emotion_name(emoji_id).map(|name| (name.to_string(), p))
                })
                .collect(),
        };

        let mut vector = EmotionVector::zero();
        for (label, value) in labeled {
            let Some(canonical) = self.map_label(&label) else {
                log.unmapped_label(classifier, &label);
                continue;
            };
            if convention.sums_folded_labels() {
                vector.accumulate(canonical, value as f32);
            } else {
                vector.raise_to(canonical, value as f32);
            }
        }
        Ok(vector)
    }

    /// Attaches a text vector to every clause: the overlap-weighted average of
    /// the sentiment segments intersecting the clause window.
    pub fn attach_text(
        &self,
        spans: Vec<ClauseSpan>,
        sentiment: &TextSentiment,
        log: &mut WarningLog,
    ) -> Result<Vec<Clause>, CongruenceError> {
        let mut unparseable = 0usize;
        let segment_vectors: Vec<Option<EmotionVector>> = sentiment
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                match self.to_vector(ClassifierKind::Text, &segment.scores, log) {
                    Ok(vector) => Some(vector),
                    Err(reason) => {
                        unparseable += 1;
                        tracing::warn!(
                            index,
                            reason = reason.as_str(),
                            "normalization: unparseable text sentiment segment"
                        );
                        log.push(AnalysisWarning::UnparseableScores {
                            classifier: ClassifierKind::Text,
                            index,
                            reason,
                        });
                        None
                    }
                }
            })
            .collect();

        if unparseable > 0 && unparseable == sentiment.segments.len() {
            return Err(CongruenceError::unknown_taxonomy(
                ClassifierKind::Text,
                format!("none of the {unparseable} sentiment segments could be parsed"),
            ));
        }

        let clauses = spans
            .into_iter()
            .map(|span| {
                let weighted = sentiment
                    .segments
                    .iter()
                    .zip(segment_vectors.iter())
                    .filter_map(|(segment, vector)| {
                        let vector = vector.as_ref()?;
                        let segment_ms = segment.end_ms.checked_sub(segment.start_ms)?;
                        let overlap = overlap_ms(
                            span.start_ms,
                            span.end_ms,
                            segment.start_ms,
                            segment.end_ms,
                        );
                        (segment_ms > 0 && overlap > 0)
                            .then(|| (vector, overlap as f64 / segment_ms as f64))
                    });
                let text_emotion =
                    EmotionVector::weighted_mean(weighted).unwrap_or_else(EmotionVector::zero);
                Clause::from_span(span, text_emotion)
            })
            .collect();
        Ok(clauses)
    }

    /// Normalizes the audio stream into time-ordered observations with a
    /// non-degenerate interval each.
    pub fn observations(
        &self,
        affect: &AudioAffect,
        log: &mut WarningLog,
    ) -> Result<Vec<AffectObservation>, CongruenceError> {
        let point_spans = PointSpans::new(self.point_sample_span_ms, affect);
        let mut unparseable = 0usize;
        let mut parsed = 0usize;
        let mut observations = Vec::with_capacity(affect.samples.len());

        for (index, sample) in affect.samples.iter().enumerate() {
            let (start_ms, end_ms, anchor_ms) = match sample.timing {
                SampleTiming::Interval { start_ms, end_ms } if end_ms > start_ms => {
                    (start_ms, end_ms, None)
                }
                SampleTiming::Interval { start_ms, end_ms } if end_ms == start_ms => {
                    point_spans.interval(start_ms)
                }
                SampleTiming::Interval { start_ms, end_ms } => {
                    let reason = format!("interval [{start_ms}, {end_ms}) ends before it starts");
                    tracing::warn!(
                        index,
                        reason = reason.as_str(),
                        "normalization: dropping audio sample"
                    );
                    log.push(AnalysisWarning::DroppedSample { index, reason });
                    continue;
                }
                SampleTiming::Point { timestamp_ms } => point_spans.interval(timestamp_ms),
            };

            let emotion = match self.to_vector(ClassifierKind::Audio, &sample.scores, log) {
                Ok(vector) => vector,
                Err(reason) => {
                    unparseable += 1;
                    tracing::warn!(
                        index,
                        reason = reason.as_str(),
                        "normalization: unparseable audio affect sample"
                    );
                    log.push(AnalysisWarning::UnparseableScores {
                        classifier: ClassifierKind::Audio,
                        index,
                        reason,
                    });
                    continue;
                }
            };
            parsed += 1;

            observations.push(AffectObservation {
                start_ms,
                end_ms,
                anchor_ms,
                emotion,
                confidence: sample.confidence.map_or(1.0, clamp_confidence),
            });
        }

        if unparseable > 0 && parsed == 0 {
            return Err(CongruenceError::unknown_taxonomy(
                ClassifierKind::Audio,
                format!("none of the {unparseable} audio affect samples could be parsed"),
            ));
        }

        if !observations
            .windows(2)
            .all(|pair| pair[0].start_ms <= pair[1].start_ms)
        {
            tracing::debug!("normalization: audio samples arrived out of order; sorting by start");
            observations.sort_by_key(|observation| observation.start_ms);
        }

        tracing::debug!(
            observation_count = observations.len(),
            point_count = point_spans.timestamps.len(),
            "normalization: audio observations ready"
        );
        Ok(observations)
    }
}

fn rescale(pairs: Vec<(String, f64)>, convention: ScoreConvention) -> Vec<(String, f64)> {
    match convention {
        ScoreConvention::Logits => softmax(pairs),
        ScoreConvention::Percent => pairs
            .into_iter()
            .map(|(label, value)| (label, value / 100.0))
            .collect(),
        ScoreConvention::Probability
        | ScoreConvention::Independent
        | ScoreConvention::EmojiDistribution => pairs,
    }
}

fn softmax(pairs: Vec<(String, f64)>) -> Vec<(String, f64)> {
    let max = pairs
        .iter()
        .map(|(_, value)| *value)
        .filter(|value| value.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return pairs.into_iter().map(|(label, _)| (label, 0.0)).collect();
    }
    let exps: Vec<(String, f64)> = pairs
        .into_iter()
        .map(|(label, value)| {
            let e = if value.is_finite() {
                (value - max).exp()
            } else {
                0.0
            };
            (label, e)
        })
        .collect();
    let total: f64 = exps.iter().map(|(_, e)| e).sum();
    exps.into_iter()
        .map(|(label, e)| (label, e / total))
        .collect()
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Implicit spans for point samples. A configured span applies to every
/// point. Otherwise a point spans the distance to its nearest neighbouring
/// point, capped at `DEFAULT_POINT_SAMPLE_SPAN_MS`, so a sparse stream never
/// stretches a sample across a silence.
struct PointSpans {
    configured_ms: Option<u64>,
    /// Sorted, distinct point timestamps.
    timestamps: Vec<u64>,
}

impl PointSpans {
    fn new(configured_ms: Option<u64>, affect: &AudioAffect) -> Self {
        let mut timestamps: Vec<u64> = affect
            .samples
            .iter()
            .filter_map(|sample| match sample.timing {
                SampleTiming::Point { timestamp_ms } => Some(timestamp_ms),
                SampleTiming::Interval { start_ms, end_ms } if start_ms == end_ms => {
                    Some(start_ms)
                }
                SampleTiming::Interval { .. } => None,
            })
            .collect();
        timestamps.sort_unstable();
        timestamps.dedup();
        Self {
            configured_ms,
            timestamps,
        }
    }

    fn span_at(&self, timestamp_ms: u64) -> u64 {
        if let Some(span_ms) = self.configured_ms {
            return span_ms;
        }
        let idx = self.timestamps.partition_point(|&t| t < timestamp_ms);
        let before = idx
            .checked_sub(1)
            .and_then(|prev| self.timestamps.get(prev))
            .map(|&prev| timestamp_ms - prev);
        let after = self
            .timestamps
            .get(idx + 1)
            .map(|&next| next.saturating_sub(timestamp_ms));
        before
            .into_iter()
            .chain(after)
            .min()
            .map_or(DEFAULT_POINT_SAMPLE_SPAN_MS, |spacing| {
                spacing.min(DEFAULT_POINT_SAMPLE_SPAN_MS)
            })
    }

    /// Span centred on the timestamp, with the timestamp kept as anchor.
    fn interval(&self, timestamp_ms: u64) -> (u64, u64, Option<u64>) {
        let span_ms = self.span_at(timestamp_ms).max(1);
        let half = span_ms / 2;
        let start_ms = timestamp_ms.saturating_sub(half);
        let end_ms = timestamp_ms.saturating_add(span_ms - half);
        (start_ms, end_ms, Some(timestamp_ms))
    }
}
