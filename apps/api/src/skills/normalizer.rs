//! Skill Normalizer — maps a raw skill token onto the canonical vocabulary.
//!
//! Cascade: exact (case-insensitive) → substring → fuzzy. A token that clears none of
//! the tiers comes back trimmed but otherwise unchanged; that is a valid result, not an error.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::skills::similarity::{NormalizedLevenshtein, SimilarityStrategy};
use crate::skills::vocabulary::Vocabulary;

pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.7;

pub struct SkillNormalizer {
    vocabulary: Arc<Vocabulary>,
    strategy: Box<dyn SimilarityStrategy>,
    cutoff: f64,
}

impl SkillNormalizer {
    pub fn new(
        vocabulary: Arc<Vocabulary>,
        strategy: Box<dyn SimilarityStrategy>,
        cutoff: f64,
    ) -> Self {
        Self {
            vocabulary,
            strategy,
            cutoff,
        }
    }

    /// Normalized Levenshtein at the default cutoff.
    pub fn with_defaults(vocabulary: Arc<Vocabulary>) -> Self {
        Self::new(vocabulary, Box::new(NormalizedLevenshtein), DEFAULT_FUZZY_CUTOFF)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Returns the canonical entry for `raw`, or `raw` trimmed when nothing qualifies.
    pub fn normalize(&self, raw: &str) -> String {
        let word = raw.trim();
        if word.is_empty() {
            return String::new();
        }

        // 1. Exact, case-insensitive
        if let Some(canonical) = self.vocabulary.canonical(word) {
            return canonical.to_string();
        }

        let lower = word.to_lowercase();

        // 2. Substring: first entry in vocabulary order wins
        if let Some(i) = self
            .vocabulary
            .lowercase()
            .iter()
            .position(|skill| lower.contains(skill.as_str()))
        {
            return self.vocabulary.skills()[i].clone();
        }

        // 3. Fuzzy
        if let Some(i) = self.closest(&lower) {
            let canonical = &self.vocabulary.skills()[i];
            debug!("Fuzzy-normalized '{word}' → '{canonical}'");
            return canonical.clone();
        }

        word.to_string()
    }

    /// Index of the best-scoring entry at or above the cutoff. Ties keep the earliest entry.
    fn closest(&self, lower: &str) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (i, candidate) in self.vocabulary.lowercase().iter().enumerate() {
            let score = self.strategy.similarity(lower, candidate);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }

        best.filter(|&(_, score)| score >= self.cutoff)
            .map(|(i, _)| i)
    }

    /// Parses comma-separated manual input into a normalized skill list.
    ///
    /// Blank pieces are dropped; entries that normalize to the same skill
    /// (case-insensitively) collapse to the first occurrence.
    pub fn parse_manual_skills(&self, input: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        input
            .split(',')
            .filter(|piece| !piece.trim().is_empty())
            .map(|piece| self.normalize(piece))
            .filter(|skill| seen.insert(skill.to_lowercase()))
            .collect()
    }
}
