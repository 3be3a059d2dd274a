use std::path::Path;

use crate::alignment::normalization::TaxonomyNormalizer;
use crate::alignment::scoring::ScoringPolicy;
use crate::config::CongruenceConfig;
use crate::error::CongruenceError;
use crate::pipeline::defaults::{BoundarySegmenter, CosineScorer, OverlapAligner};
use crate::pipeline::runtime::{CongruenceEngine, CongruenceEngineParts};
use crate::pipeline::traits::{
    ClauseSegmenter, CongruenceScorer, SignalNormalizer, TemporalAligner,
};

pub struct CongruenceEngineBuilder {
    config: CongruenceConfig,
    segmenter: Option<Box<dyn ClauseSegmenter>>,
    normalizer: Option<Box<dyn SignalNormalizer>>,
    aligner: Option<Box<dyn TemporalAligner>>,
    scorer: Option<Box<dyn CongruenceScorer>>,
}

impl CongruenceEngineBuilder {
    pub fn new(config: CongruenceConfig) -> Self {
        Self {
            config,
            segmenter: None,
            normalizer: None,
            aligner: None,
            scorer: None,
        }
    }

    pub fn from_config_file(path: &Path) -> Result<Self, CongruenceError> {
        Ok(Self::new(CongruenceConfig::load(path)?))
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn ClauseSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn SignalNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_aligner(mut self, aligner: Box<dyn TemporalAligner>) -> Self {
        self.aligner = Some(aligner);
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn CongruenceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn build(self) -> Result<CongruenceEngine, CongruenceError> {
        self.config.validate()?;

        let normalizer: Box<dyn SignalNormalizer> = match self.normalizer {
            Some(normalizer) => normalizer,
            None => Box::new(TaxonomyNormalizer::from_config(&self.config)),
        };
        let scorer: Box<dyn CongruenceScorer> = match self.scorer {
            Some(scorer) => scorer,
            None => Box::new(CosineScorer {
                policy: ScoringPolicy::from_config(&self.config)?,
            }),
        };
        let aligner: Box<dyn TemporalAligner> = self
            .aligner
            .unwrap_or_else(|| Box::new(OverlapAligner::from_config(&self.config)));

        tracing::debug!(
            divergence_threshold = self.config.divergence_threshold,
            min_alignment_confidence = self.config.min_alignment_confidence,
            top_k = self.config.top_k_worst_clauses,
            "engine: built"
        );

        Ok(CongruenceEngine::from_parts(CongruenceEngineParts {
            segmenter: self
                .segmenter
                .unwrap_or_else(|| Box::new(BoundarySegmenter)),
            normalizer,
            aligner,
            scorer,
            config: self.config,
        }))
    }
}
