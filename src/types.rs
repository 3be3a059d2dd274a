use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{ClassifierKind, EmotionLabel, EmotionVector};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub text: String,
    /// Millisecond interval is [start_ms, end_ms), i.e. start inclusive/end exclusive.
    pub start_ms: u64,
    /// Millisecond interval is [start_ms, end_ms), i.e. start inclusive/end exclusive.
    pub end_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub words: Vec<TranscriptWord>,
    /// Full recording length, when the transcription service reports it.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// One clause- or sentence-level result from the text classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default)]
    pub text: Option<String>,
    /// Raw classifier output; its shape is only interpreted by the normalizer.
    pub scores: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSentiment {
    pub segments: Vec<SentimentSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleTiming {
    Interval { start_ms: u64, end_ms: u64 },
    Point { timestamp_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAffectSample {
    #[serde(flatten)]
    pub timing: SampleTiming,
    pub scores: serde_json::Value,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioAffect {
    pub samples: Vec<AudioAffectSample>,
}

/// Everything one analysis run consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub transcript: Transcript,
    pub text_sentiment: TextSentiment,
    pub audio_affect: AudioAffect,
}

/// Clause window produced by the segmenter, before any emotion is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseSpan {
    pub id: String,
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl ClauseSpan {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub id: String,
    pub index: usize,
    /// Millisecond interval is [start_ms, end_ms), i.e. start inclusive/end exclusive.
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub text_emotion: EmotionVector,
}

impl Clause {
    pub fn from_span(span: ClauseSpan, text_emotion: EmotionVector) -> Self {
        Self {
            id: span.id,
            index: span.index,
            start_ms: span.start_ms,
            end_ms: span.end_ms,
            text: span.text,
            text_emotion,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A normalized audio-affect sample. Point samples have already been given
/// their implicit span, so `start_ms < end_ms` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct AffectObservation {
    pub start_ms: u64,
    pub end_ms: u64,
    /// Timestamp of a point sample. When set, the sample belongs only to the
    /// clause containing it; the span then measures coverage, not membership.
    pub anchor_ms: Option<u64>,
    pub emotion: EmotionVector,
    /// Classifier-reported confidence in [0, 1]; 1 when none was reported.
    pub confidence: f32,
}

impl AffectObservation {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn is_point(&self) -> bool {
        self.anchor_ms.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedClause {
    pub clause: Clause,
    pub audio_emotion: EmotionVector,
    /// 0 = no audio overlapped the clause, 1 = fully covered.
    pub alignment_confidence: f32,
    pub observation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CongruenceResult {
    pub clause_id: String,
    pub score: f32,
    pub dominant_text_emotion: Option<EmotionLabel>,
    pub dominant_audio_emotion: Option<EmotionLabel>,
    pub divergent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredClause {
    pub aligned: AlignedClause,
    pub result: CongruenceResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OverallScore {
    Scored { value: f32 },
    InsufficientData,
}

impl OverallScore {
    pub fn value(&self) -> Option<f32> {
        match self {
            Self::Scored { value } => Some(*value),
            Self::InsufficientData => None,
        }
    }
}

/// Locally recovered problems. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    UnmappedLabel {
        classifier: ClassifierKind,
        label: String,
    },
    UnparseableScores {
        classifier: ClassifierKind,
        index: usize,
        reason: String,
    },
    DroppedSample {
        index: usize,
        reason: String,
    },
    InsufficientData {
        clause_count: usize,
    },
}

/// Collects warnings for one run. Unmapped labels are reported once per
/// classifier/label pair.
#[derive(Debug, Default)]
pub struct WarningLog {
    warnings: Vec<AnalysisWarning>,
    seen_unmapped: HashSet<(ClassifierKind, String)>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: AnalysisWarning) {
        self.warnings.push(warning);
    }

    pub fn unmapped_label(&mut self, classifier: ClassifierKind, label: &str) {
        if self.seen_unmapped.insert((classifier, label.to_string())) {
            tracing::warn!(
                classifier = classifier.as_str(),
                label,
                "normalization: dropping label outside the canonical taxonomy"
            );
            self.warnings.push(AnalysisWarning::UnmappedLabel {
                classifier,
                label: label.to_string(),
            });
        }
    }

    pub fn as_slice(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    pub fn into_vec(self) -> Vec<AnalysisWarning> {
        self.warnings
    }
}
