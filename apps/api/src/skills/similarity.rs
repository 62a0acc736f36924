//! Fuzzy string similarity used as the last tier of skill normalization.
//!
//! Strategies sit behind `SimilarityStrategy` so the algorithm and cutoff can be
//! swapped from config without touching the normalizer.

use std::str::FromStr;

/// A string similarity on a 0.0 – 1.0 scale, where 1.0 means identical.
pub trait SimilarityStrategy: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Edit distance normalized by the longer string's length.
pub struct NormalizedLevenshtein;

impl SimilarityStrategy for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// Jaro-Winkler, which rewards shared prefixes ("kube" → "kubernetes").
pub struct JaroWinkler;

impl SimilarityStrategy for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

/// Sørensen-Dice coefficient over character bigrams.
pub struct SorensenDice;

impl SimilarityStrategy for SorensenDice {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::sorensen_dice(a, b)
    }
}

/// Config-facing name of a strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyKind {
    #[default]
    Levenshtein,
    JaroWinkler,
    SorensenDice,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn SimilarityStrategy> {
        match self {
            StrategyKind::Levenshtein => Box::new(NormalizedLevenshtein),
            StrategyKind::JaroWinkler => Box::new(JaroWinkler),
            StrategyKind::SorensenDice => Box::new(SorensenDice),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "levenshtein" => Ok(StrategyKind::Levenshtein),
            "jaro-winkler" | "jaro_winkler" => Ok(StrategyKind::JaroWinkler),
            "sorensen-dice" | "sorensen_dice" | "dice" => Ok(StrategyKind::SorensenDice),
            other => Err(format!(
                "unknown fuzzy strategy '{other}' (expected levenshtein, jaro-winkler or sorensen-dice)"
            )),
        }
    }
}
