use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CongruenceError;
use crate::taxonomy::{EmotionLabel, LabelPriority, ScoreConvention};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CongruenceConfig {
    /// Clauses scoring below this are flagged divergent (when confident enough).
    pub divergence_threshold: f32,
    /// Minimum alignment confidence a clause needs before it may be flagged.
    pub min_alignment_confidence: f32,
    pub top_k_worst_clauses: usize,
    /// Dominant-emotion tie-break order. Missing labels follow in canonical order.
    pub canonical_label_priority: Vec<EmotionLabel>,
    pub text_scale: ScoreConvention,
    pub audio_scale: ScoreConvention,
    /// Span given to point-in-time audio samples. `None` uses the spacing to
    /// the nearest neighbouring point, capped at 1000 ms.
    pub point_sample_span_ms: Option<u64>,
    /// Clause count at which per-clause work switches to the rayon pool.
    pub parallel_clause_threshold: usize,
    /// Extra source-label synonyms, consulted before the built-in table.
    pub label_aliases: BTreeMap<String, EmotionLabel>,
}

impl CongruenceConfig {
    pub const DEFAULT_DIVERGENCE_THRESHOLD: f32 = 0.4;
    pub const DEFAULT_MIN_ALIGNMENT_CONFIDENCE: f32 = 0.2;
    pub const DEFAULT_TOP_K_WORST_CLAUSES: usize = 5;
    pub const DEFAULT_PARALLEL_CLAUSE_THRESHOLD: usize = 32;

    pub fn load(path: &Path) -> Result<Self, CongruenceError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| CongruenceError::io("read congruence config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| CongruenceError::json("parse congruence config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CongruenceError> {
        check_unit_interval("divergence_threshold", self.divergence_threshold)?;
        check_unit_interval("min_alignment_confidence", self.min_alignment_confidence)?;
        if self.point_sample_span_ms == Some(0) {
            return Err(CongruenceError::invalid_config(
                "point_sample_span_ms must be > 0 when set",
            ));
        }
        if let Some(alias) = self
            .label_aliases
            .keys()
            .find(|alias| crate::alignment::normalization::label_key(alias).is_empty())
        {
            return Err(CongruenceError::invalid_config(format!(
                "label alias '{alias}' has no alphanumeric characters"
            )));
        }
        self.label_priority().map(|_| ())
    }

    pub fn label_priority(&self) -> Result<LabelPriority, CongruenceError> {
        LabelPriority::new(&self.canonical_label_priority)
    }
}

impl Default for CongruenceConfig {
    fn default() -> Self {
        Self {
            divergence_threshold: Self::DEFAULT_DIVERGENCE_THRESHOLD,
            min_alignment_confidence: Self::DEFAULT_MIN_ALIGNMENT_CONFIDENCE,
            top_k_worst_clauses: Self::DEFAULT_TOP_K_WORST_CLAUSES,
            canonical_label_priority: EmotionLabel::ALL.to_vec(),
            text_scale: ScoreConvention::Probability,
            audio_scale: ScoreConvention::Independent,
            point_sample_span_ms: None,
            parallel_clause_threshold: Self::DEFAULT_PARALLEL_CLAUSE_THRESHOLD,
            label_aliases: BTreeMap::new(),
        }
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<(), CongruenceError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CongruenceError::invalid_config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
