//! Canonical emotion taxonomy shared by every classifier output.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CongruenceError;

/// L2 norm below which a vector is treated as carrying no signal.
pub const NEAR_ZERO_NORM: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Joy,
    Anger,
    Sadness,
    Fear,
    Disgust,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    pub const COUNT: usize = 7;

    /// Canonical order. Also the default tie-break priority.
    pub const ALL: [EmotionLabel; Self::COUNT] = [
        EmotionLabel::Joy,
        EmotionLabel::Anger,
        EmotionLabel::Sadness,
        EmotionLabel::Fear,
        EmotionLabel::Disgust,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Anger => "anger",
            Self::Sadness => "sadness",
            Self::Fear => "fear",
            Self::Disgust => "disgust",
            Self::Surprise => "surprise",
            Self::Neutral => "neutral",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which external classifier produced a score structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Text,
    Audio,
}

impl ClassifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a classifier's raw numbers must be read before folding onto the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreConvention {
    /// Values in [0, 1] that sum to ~1. Folded labels are summed.
    Probability,
    /// Independent per-label confidences in [0, 1]. Folded labels take the max.
    Independent,
    /// Unbounded scores; softmax over every source label, then as `Probability`.
    Logits,
    /// Values in [0, 100]; divided by 100, then as `Independent`.
    Percent,
    /// 64 DeepMoji emoji probabilities folded through the emoji table, then summed.
    EmojiDistribution,
}

impl ScoreConvention {
    pub(crate) fn sums_folded_labels(self) -> bool {
        matches!(
            self,
            Self::Probability | Self::Logits | Self::EmojiDistribution
        )
    }
}

/// Dense vector over the canonical labels. Every label is always present and
/// every value is kept in [0, 1]; the values need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<EmotionLabel, f32>",
    from = "BTreeMap<EmotionLabel, f32>"
)]
pub struct EmotionVector {
    values: [f32; EmotionLabel::COUNT],
}

impl EmotionVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (EmotionLabel, f32)>) -> Self {
        let mut vector = Self::zero();
        for (label, value) in pairs {
            vector.set(label, value);
        }
        vector
    }

    pub fn get(&self, label: EmotionLabel) -> f32 {
        self.values[label.slot()]
    }

    pub fn set(&mut self, label: EmotionLabel, value: f32) {
        self.values[label.slot()] = sanitize(value);
    }

    /// Adds to a label, saturating at 1.
    pub(crate) fn accumulate(&mut self, label: EmotionLabel, value: f32) {
        let current = self.get(label);
        self.set(label, current + sanitize(value));
    }

    pub(crate) fn raise_to(&mut self, label: EmotionLabel, value: f32) {
        let current = self.get(label);
        self.set(label, current.max(sanitize(value)));
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f32)> + '_ {
        EmotionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.get(label)))
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_near_zero(&self) -> bool {
        self.l2_norm() < NEAR_ZERO_NORM
    }

    /// Per-label weighted average. Non-positive weights are ignored; `None`
    /// when no weight remains.
    pub fn weighted_mean<'a>(
        items: impl IntoIterator<Item = (&'a EmotionVector, f64)>,
    ) -> Option<EmotionVector> {
        let mut sums = [0.0f64; EmotionLabel::COUNT];
        let mut total_weight = 0.0f64;
        for (vector, weight) in items {
            if !(weight.is_finite() && weight > 0.0) {
                continue;
            }
            total_weight += weight;
            for (sum, &value) in sums.iter_mut().zip(vector.values.iter()) {
                *sum += weight * value as f64;
            }
        }
        if total_weight <= 0.0 {
            return None;
        }
        Some(EmotionVector {
            values: sums.map(|sum| sanitize((sum / total_weight) as f32)),
        })
    }

    /// Argmax label; ties go to the label ranked first by `priority`.
    /// `None` for a vector with no signal.
    pub fn dominant(&self, priority: &LabelPriority) -> Option<EmotionLabel> {
        if self.is_near_zero() {
            return None;
        }
        let mut best: Option<(EmotionLabel, f32)> = None;
        for &label in priority.labels() {
            let value = self.get(label);
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((label, value)),
            }
        }
        best.map(|(label, _)| label)
    }
}

impl From<BTreeMap<EmotionLabel, f32>> for EmotionVector {
    fn from(map: BTreeMap<EmotionLabel, f32>) -> Self {
        Self::from_pairs(map)
    }
}

impl From<EmotionVector> for BTreeMap<EmotionLabel, f32> {
    fn from(vector: EmotionVector) -> Self {
        vector.iter().collect()
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        0.0
    }
}

/// Total, duplicate-free ordering of the canonical labels used to break
/// dominant-emotion ties deterministically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPriority {
    order: Vec<EmotionLabel>,
}

impl LabelPriority {
    /// Labels missing from `preferred` are appended in canonical order.
    pub fn new(preferred: &[EmotionLabel]) -> Result<Self, CongruenceError> {
        let mut order = Vec::with_capacity(EmotionLabel::COUNT);
        for &label in preferred {
            if order.contains(&label) {
                return Err(CongruenceError::invalid_config(format!(
                    "canonical_label_priority lists '{label}' more than once"
                )));
            }
            order.push(label);
        }
        for label in EmotionLabel::ALL {
            if !order.contains(&label) {
                order.push(label);
            }
        }
        Ok(Self { order })
    }

    pub fn labels(&self) -> &[EmotionLabel] {
        &self.order
    }
}

impl Default for LabelPriority {
    fn default() -> Self {
        Self {
            order: EmotionLabel::ALL.to_vec(),
        }
    }
}
