use thiserror::Error;

use crate::taxonomy::ClassifierKind;

#[derive(Debug, Error)]
pub enum CongruenceError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed transcript: {message}")]
    MalformedTranscript { message: String },
    #[error("unknown taxonomy in {classifier} classifier output: {message}")]
    UnknownTaxonomy {
        classifier: ClassifierKind,
        message: String,
    },
    #[error("analysis canceled during {stage}")]
    Canceled { stage: &'static str },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl CongruenceError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn malformed_transcript(message: impl Into<String>) -> Self {
        Self::MalformedTranscript {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_taxonomy(classifier: ClassifierKind, message: impl Into<String>) -> Self {
        Self::UnknownTaxonomy {
            classifier,
            message: message.into(),
        }
    }

    pub(crate) fn canceled(stage: &'static str) -> Self {
        Self::Canceled { stage }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Cancellation is caller-initiated and should be surfaced as a no-op,
    /// not as an analysis failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }

    /// True for failures that mean the recording could not be analyzed at all.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedTranscript { .. } | Self::UnknownTaxonomy { .. }
        )
    }
}
