pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod taxonomy;
pub mod types;

pub use alignment::report::{AnalysisReport, ClauseReport};
pub use config::CongruenceConfig;
pub use error::CongruenceError;
pub use pipeline::builder::CongruenceEngineBuilder;
pub use pipeline::cancel::CancelSignal;
pub use pipeline::runtime::CongruenceEngine;
pub use pipeline::traits::{ClauseSegmenter, CongruenceScorer, SignalNormalizer, TemporalAligner};
pub use taxonomy::{EmotionLabel, EmotionVector, ScoreConvention};
pub use types::{
    AnalysisInput, AnalysisWarning, AudioAffect, CongruenceResult, OverallScore, TextSentiment,
    Transcript,
};

/// One-shot analysis of a single recording with the default stages.
pub fn analyze(
    transcript: &Transcript,
    text_sentiment: &TextSentiment,
    audio_affect: &AudioAffect,
    config: &CongruenceConfig,
) -> Result<AnalysisReport, CongruenceError> {
    let engine = CongruenceEngineBuilder::new(config.clone()).build()?;
    engine.run(transcript, text_sentiment, audio_affect, &CancelSignal::new())
}
