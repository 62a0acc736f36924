//! Skill Extractor — pulls a normalized skill set out of free text.
//!
//! Candidates come from two sources:
//! 1. a literal scan for vocabulary entries (Aho-Corasick, ASCII case-insensitive,
//!    word-boundary delimited, longest match at each position)
//! 2. recognizer entities whose text is exactly a vocabulary entry
//!
//! Every candidate is then normalized; the result is sorted and deduplicated.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::debug;

use crate::skills::normalizer::SkillNormalizer;
use crate::skills::recognizer::{EntityRecognizer, RecognizerError};
use crate::skills::vocabulary::VocabularyError;

pub struct SkillExtractor {
    normalizer: Arc<SkillNormalizer>,
    recognizer: Arc<dyn EntityRecognizer>,
    automaton: AhoCorasick,
}

impl SkillExtractor {
    /// Builds the matching automaton once from the normalizer's vocabulary.
    pub fn new(
        normalizer: Arc<SkillNormalizer>,
        recognizer: Arc<dyn EntityRecognizer>,
    ) -> Result<Self, VocabularyError> {
        // Standard match kind so overlapping matches can be enumerated; longest-match
        // selection happens after boundary filtering in `literal_matches`.
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(normalizer.vocabulary().skills())?;

        Ok(Self {
            normalizer,
            recognizer,
            automaton,
        })
    }

    /// Returns the sorted, deduplicated, normalized skills found in `text`.
    pub fn extract(&self, text: &str) -> Result<Vec<String>, RecognizerError> {
        let mut candidates: HashSet<&str> = self.literal_matches(text).into_iter().collect();
        let literal_count = candidates.len();

        let vocabulary = self.normalizer.vocabulary();
        let entities = self.recognizer.recognize(text)?;
        let mut entity_hits = Vec::new();
        for entity in &entities {
            if vocabulary.contains(&entity.text) {
                entity_hits.push(entity.text.as_str());
            }
        }
        candidates.extend(entity_hits);

        let skills: BTreeSet<String> = candidates
            .into_iter()
            .map(|c| self.normalizer.normalize(c))
            .filter(|s| !s.is_empty())
            .collect();

        debug!(
            "Extracted {} skills ({} literal candidates, {} entities)",
            skills.len(),
            literal_count,
            entities.len()
        );

        Ok(skills.into_iter().collect())
    }

    /// Non-overlapping vocabulary hits, as written in `text`.
    ///
    /// Among matches that satisfy the word-boundary rule, the leftmost wins and, at equal
    /// start, the longest wins. A longer entry that fails the boundary check therefore
    /// falls back to a shorter one at the same position ("SQL Serverless" → "SQL").
    fn literal_matches<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut hits: Vec<(usize, usize)> = self
            .automaton
            .find_overlapping_iter(text)
            .filter(|m| is_word_delimited(text, m.start(), m.end()))
            .map(|m| (m.start(), m.end()))
            .collect();

        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut selected = Vec::new();
        let mut cursor = 0;
        for (start, end) in hits {
            if start >= cursor {
                selected.push(&text[start..end]);
                cursor = end;
            }
        }
        selected
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A boundary is only required on a side where the match itself ends in a word
/// character, so entries such as `C++` or `.NET` still match next to spaces.
fn is_word_delimited(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];

    let starts_with_word = matched.chars().next().is_some_and(is_word_char);
    let ends_with_word = matched.chars().next_back().is_some_and(is_word_char);

    let before_ok = !starts_with_word || !text[..start].chars().next_back().is_some_and(is_word_char);
    let after_ok = !ends_with_word || !text[end..].chars().next().is_some_and(is_word_char);

    before_ok && after_ok
}
