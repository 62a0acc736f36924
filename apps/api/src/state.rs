use std::sync::Arc;

use crate::analysis::scorer::MatchScorer;
use crate::config::Config;
use crate::embedding_client::EmbeddingProvider;
use crate::skills::extractor::SkillExtractor;
use crate::skills::normalizer::SkillNormalizer;
use crate::skills::recognizer::EntityRecognizer;
use crate::skills::vocabulary::{RoleCatalog, Vocabulary, VocabularyError};

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything in it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub roles: Arc<RoleCatalog>,
    pub normalizer: Arc<SkillNormalizer>,
    pub extractor: Arc<SkillExtractor>,
    /// Pluggable embedding backend behind the scorer. Default: HashingEmbedder.
    pub scorer: Arc<MatchScorer>,
}

impl AppState {
    /// Wires the skill core together from an already-loaded vocabulary.
    pub fn build(
        config: Config,
        vocabulary: Vocabulary,
        roles: RoleCatalog,
        recognizer: Arc<dyn EntityRecognizer>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, VocabularyError> {
        let normalizer = Arc::new(SkillNormalizer::new(
            Arc::new(vocabulary),
            config.fuzzy_strategy.build(),
            config.fuzzy_cutoff,
        ));
        let extractor = Arc::new(SkillExtractor::new(normalizer.clone(), recognizer)?);

        Ok(Self {
            config,
            roles: Arc::new(roles),
            normalizer,
            extractor,
            scorer: Arc::new(MatchScorer::new(embedder)),
        })
    }
}
